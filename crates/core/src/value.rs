//! Value types for djson
//!
//! This module defines:
//! - Value: closed tagged union over every value kind a telemetry record can carry
//!
//! ## Value Model
//!
//! The kind of a value is decided once, when the inbound record is decoded,
//! and the encoder dispatches on it with a single exhaustive match:
//! - Null, Bool, Int, UInt, Float, Time, String
//! - Bytes, Array, Map (composites, shipped as text)
//!
//! ### Type Rules
//!
//! - `Int(1) != Float(1.0)` - different kinds are never equal
//! - `Map` keeps insertion order; two maps with the same pairs in a different
//!   order are different values
//! - Map keys are values, not only strings (MessagePack allows any key)
//!
//! ## Stringified form
//!
//! `Display` renders the default stringified form used when a composite is
//! shipped as text: arrays as `[a, b]`, maps as `{k: v}`, with strings inside
//! composites JSON-quoted so the text stays unambiguous.

use crate::time::EventTime;
use crate::wire::{float_text, json_quote};
use base64::Engine as _;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// A single record value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Unsigned integer too large for `Int`
    UInt(u64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// Time instant
    Time(EventTime),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Ordered mapping
    Map(Vec<(Value, Value)>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Get the kind name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::UInt(_) => "UInt",
            Value::Float(_) => "Float",
            Value::Time(_) => "Time",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is an array, map or bytes value
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_) | Value::Bytes(_))
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the time instant if this is a Time value
    pub fn as_time(&self) -> Option<EventTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Get the pairs if this is a Map value
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert to a JSON document
    ///
    /// Map keys that are not strings use their stringified form. Time
    /// instants become `[secs, nanos]`, bytes become base64 text and
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::UInt(u) => serde_json::Value::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Time(t) => serde_json::Value::Array(vec![
                serde_json::Value::from(t.secs()),
                serde_json::Value::from(t.subsec_nanos()),
            ]),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(base64_text(b)),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Map(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (map_key_text(k), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Base64 text of raw bytes, as shipped on the wire
pub fn base64_text(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn map_key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Float(x) => f.write_str(&float_text(*x)),
            Value::Time(t) => write!(f, "[{},{}]", t.secs(), t.subsec_nanos()),
            Value::String(s) => f.write_str(&json_quote(s)),
            Value::Bytes(b) => f.write_str(&json_quote(&base64_text(b))),
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::UInt(u),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<EventTime> for Value {
    fn from(t: EventTime) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Decoding from self-describing formats (JSON, MessagePack)
// ============================================================================

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a record value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(v) = seq.next_element()? {
            items.push(v);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry()? {
            pairs.push((k, v));
        }
        Ok(Value::Map(pairs))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_not_equal_float() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_nan_not_equal_nan() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_map_equality_is_ordered() {
        let a = Value::Map(vec![("a".into(), 1.into()), ("b".into(), 2.into())]);
        let b = Value::Map(vec![("b".into(), 2.into()), ("a".into(), 1.into())]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Null.type_name(), "Null");
        assert_eq!(Value::UInt(u64::MAX).type_name(), "UInt");
        assert_eq!(Value::Time(EventTime::EPOCH).type_name(), "Time");
        assert_eq!(Value::Map(vec![]).type_name(), "Map");
    }

    #[test]
    fn test_from_u64_prefers_int() {
        assert_eq!(Value::from(7u64), Value::Int(7));
        assert_eq!(Value::from(u64::MAX), Value::UInt(u64::MAX));
    }

    #[test]
    fn test_display_array() {
        assert_eq!(Value::Array(vec![Value::Int(1)]).to_string(), "[1]");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(Value::Array(vec!["a".into()]).to_string(), r#"["a"]"#);
    }

    #[test]
    fn test_display_map() {
        let m = Value::Map(vec![(Value::Int(1), Value::Int(2))]);
        assert_eq!(m.to_string(), "{1: 2}");

        let nested = Value::Map(vec![(
            "k".into(),
            Value::Array(vec![Value::Null, Value::Bool(true)]),
        )]);
        assert_eq!(nested.to_string(), r#"{"k": [null, true]}"#);
    }

    #[test]
    fn test_display_time_and_float() {
        assert_eq!(Value::Time(EventTime::new(5, 6)).to_string(), "[5,6]");
        assert_eq!(Value::Float(3.14).to_string(), "3.14");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
    }

    #[test]
    fn test_to_json_map_keys() {
        let m = Value::Map(vec![
            (Value::Int(1), Value::Int(2)),
            ("s".into(), Value::Time(EventTime::new(1, 2))),
        ]);
        let json = m.to_json();
        assert_eq!(json["1"], serde_json::json!(2));
        assert_eq!(json["s"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_to_json_non_finite_is_null() {
        assert!(Value::Float(f64::INFINITY).to_json().is_null());
    }

    #[test]
    fn test_deserialize_from_json_preserves_order() {
        let v: Value = serde_json::from_str(r#"{"z": 1, "a": [true, null, 2.5], "m": "x"}"#).unwrap();
        let pairs = v.as_map().unwrap();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str().unwrap()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(
            pairs[1].1,
            Value::Array(vec![Value::Bool(true), Value::Null, Value::Float(2.5)])
        );
    }

    #[test]
    fn test_deserialize_large_unsigned() {
        let v: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(v, Value::UInt(u64::MAX));
    }

    #[test]
    fn test_deserialize_from_msgpack_with_int_keys() {
        let mut inner = std::collections::BTreeMap::new();
        inner.insert(1i64, 2i64);
        let bytes = rmp_serde::to_vec(&inner).unwrap();
        let v: Value = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(v, Value::Map(vec![(Value::Int(1), Value::Int(2))]));
    }

    #[test]
    fn test_from_serde_json_value() {
        let v = Value::from(serde_json::json!({"a": [1, "two"]}));
        assert_eq!(
            v,
            Value::Map(vec![(
                "a".into(),
                Value::Array(vec![Value::Int(1), "two".into()])
            )])
        );
    }
}
