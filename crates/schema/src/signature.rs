//! Structural signatures of records
//!
//! Two records share a signature exactly when they have the same field names,
//! in the same order, with values of the same wire types. The signature is
//! only ever used as a lookup key; it never goes on the wire.

use djson_core::{json_quote, Record, WireType};
use std::fmt;

/// Lookup key of the schema table
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Signature of a record
    ///
    /// For each field in order this appends the quoted field name, a comma,
    /// the wire type name and a comma. Quoting keeps names containing commas
    /// from colliding with a different field split. When `time_index` is set
    /// it is prepended, since the same fields then produce a different
    /// descriptor.
    pub fn of(record: &Record, time_index: Option<usize>) -> Self {
        let mut key = String::with_capacity(record.len() * 24);
        if let Some(idx) = time_index {
            key.push('@');
            key.push_str(&idx.to_string());
            key.push(',');
        }
        for (name, value) in record.iter() {
            key.push_str(&json_quote(name));
            key.push(',');
            key.push_str(WireType::of(value).as_str());
            key.push(',');
        }
        Signature(key)
    }

    /// The raw key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.0)
    }
}
