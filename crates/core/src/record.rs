//! Telemetry records
//!
//! A record is an ordered list of named fields. Field order is significant:
//! it lines the schema descriptor up with the encoded value array, so it is
//! preserved from decoding through encoding.

use crate::value::Value;
use rustc_hash::FxHashMap;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// Ordered mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` fields
    pub fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set a field
    ///
    /// An existing field keeps its position and gets the new value; a new
    /// field goes last.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Build a record from decoded fields in one pass
    ///
    /// A repeated name keeps its first position and takes the last value.
    pub fn from_fields(fields: Vec<(String, Value)>) -> Self {
        let mut index: FxHashMap<String, usize> =
            FxHashMap::with_capacity_and_hasher(fields.len(), Default::default());
        let mut out: Vec<(String, Value)> = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            match index.get(&name) {
                Some(&pos) => out[pos].1 = value,
                None => {
                    index.insert(name.clone(), out.len());
                    out.push((name, value));
                }
            }
        }
        Record { fields: out }
    }

    /// Set a field and move it to the last position
    pub fn push_last(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, value.into()));
    }

    /// Builder-style `insert`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterate values in field order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record::from_fields(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for Record {
    type Error = crate::Error;

    /// Convert a map whose keys are all strings
    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Map(pairs) => {
                let mut fields = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    match k {
                        Value::String(name) => fields.push((name, v)),
                        other => {
                            return Err(crate::Error::Serialization(format!(
                                "record field names must be strings, got {}",
                                other.type_name()
                            )))
                        }
                    }
                }
                Ok(Record::from_fields(fields))
            }
            other => Err(crate::Error::Serialization(format!(
                "record must be a map, got {}",
                other.type_name()
            ))),
        }
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
        let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some(entry) = map.next_entry::<String, Value>()? {
            fields.push(entry);
        }
        Ok(Record::from_fields(fields))
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_duplicates_keep_first_position() {
        let r: Record = serde_json::from_str(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        let names: Vec<_> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_wide_record_decodes_in_order() {
        let body: Vec<String> = (0..20_000).map(|i| format!("\"f{}\":{}", i, i)).collect();
        let r: Record = serde_json::from_str(&format!("{{{}}}", body.join(","))).unwrap();
        assert_eq!(r.len(), 20_000);
        assert_eq!(r.iter().nth(12_345).map(|(n, _)| n), Some("f12345"));
        assert_eq!(r.get("f19999"), Some(&Value::Int(19_999)));
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut r = Record::new().with("a", 1).with("b", 2);
        r.insert("a", 3);
        let names: Vec<_> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_push_last_moves_field() {
        let mut r = Record::new().with("ts", 0).with("msg", "hi");
        r.push_last("ts", 9);
        let names: Vec<_> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["msg", "ts"]);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_deserialize_json_keeps_order() {
        let r: Record = serde_json::from_str(r#"{"z": 1, "a": "x", "m": null}"#).unwrap();
        let names: Vec<_> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        assert!(r.get("m").unwrap().is_null());
    }

    #[test]
    fn test_deserialize_rejects_non_map() {
        assert!(serde_json::from_str::<Record>("[1, 2]").is_err());
    }

    #[test]
    fn test_try_from_value() {
        let v = Value::Map(vec![("n".into(), Value::Int(1))]);
        let r = Record::try_from(v).unwrap();
        assert_eq!(r.get("n"), Some(&Value::Int(1)));

        let bad = Value::Map(vec![(Value::Int(1), Value::Int(2))]);
        assert!(Record::try_from(bad).is_err());
        assert!(Record::try_from(Value::Null).is_err());
    }

    #[test]
    fn test_from_iter() {
        let r: Record = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(r.len(), 2);
        assert!(!r.is_empty());
    }
}
