//! Wire types and text primitives of the djson format
//!
//! Every value shipped to the agent belongs to one of five wire types. The
//! mapping from value kind to wire type is total: kinds without a wire type
//! of their own (composites, null, bytes) are shipped as `FT_STRING`.

use crate::value::Value;
use std::fmt;

/// The agent's fixed set of encodable value categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// `FT_BOOL`
    Bool,
    /// `FT_INT64`
    Int64,
    /// `FT_DOUBLE`
    Double,
    /// `FT_TIME`
    Time,
    /// `FT_STRING`
    String,
}

impl WireType {
    /// Wire type of a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => WireType::Bool,
            Value::Int(_) | Value::UInt(_) => WireType::Int64,
            Value::Float(_) => WireType::Double,
            Value::Time(_) => WireType::Time,
            Value::String(_)
            | Value::Null
            | Value::Bytes(_)
            | Value::Array(_)
            | Value::Map(_) => WireType::String,
        }
    }

    /// Name used in schema descriptors
    pub const fn as_str(&self) -> &'static str {
        match self {
            WireType::Bool => "FT_BOOL",
            WireType::Int64 => "FT_INT64",
            WireType::Double => "FT_DOUBLE",
            WireType::Time => "FT_TIME",
            WireType::String => "FT_STRING",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote text as a JSON string literal
///
/// Escapes `"`, `\` and every control character below 0x20 (NUL included),
/// so the result parses back to the exact input with any JSON parser.
pub fn json_quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Shortest round-trip text of a float
///
/// Integral values keep a trailing `.0`. NaN and infinities have no JSON
/// spelling and render as `null`.
pub fn float_text(f: f64) -> String {
    match serde_json::Number::from_f64(f) {
        Some(n) => n.to_string(),
        None => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::EventTime;
    use proptest::prelude::*;

    #[test]
    fn test_wire_type_table() {
        assert_eq!(WireType::of(&Value::Bool(true)), WireType::Bool);
        assert_eq!(WireType::of(&Value::Bool(false)), WireType::Bool);
        assert_eq!(WireType::of(&Value::Int(-3)), WireType::Int64);
        assert_eq!(WireType::of(&Value::UInt(u64::MAX)), WireType::Int64);
        assert_eq!(WireType::of(&Value::Float(0.5)), WireType::Double);
        assert_eq!(WireType::of(&Value::Time(EventTime::EPOCH)), WireType::Time);
        assert_eq!(WireType::of(&"s".into()), WireType::String);
        assert_eq!(WireType::of(&Value::Null), WireType::String);
        assert_eq!(WireType::of(&Value::Array(vec![])), WireType::String);
        assert_eq!(WireType::of(&Value::Map(vec![])), WireType::String);
        assert_eq!(WireType::of(&Value::Bytes(vec![1])), WireType::String);
    }

    #[test]
    fn test_wire_type_names() {
        assert_eq!(WireType::Bool.to_string(), "FT_BOOL");
        assert_eq!(WireType::Int64.as_str(), "FT_INT64");
        assert_eq!(WireType::Double.as_str(), "FT_DOUBLE");
        assert_eq!(WireType::Time.as_str(), "FT_TIME");
        assert_eq!(WireType::String.as_str(), "FT_STRING");
    }

    #[test]
    fn test_json_quote_control_chars() {
        assert_eq!(json_quote("hello\u{0000}world"), r#""hello\u0000world""#);
        assert_eq!(json_quote("A\"B"), r#""A\"B""#);
        assert_eq!(json_quote("a\\b"), r#""a\\b""#);
        assert_eq!(json_quote("line\n"), r#""line\n""#);
    }

    #[test]
    fn test_float_text() {
        assert_eq!(float_text(3.14), "3.14");
        assert_eq!(float_text(1.0), "1.0");
        assert_eq!(float_text(-0.5), "-0.5");
        assert_eq!(float_text(f64::NAN), "null");
        assert_eq!(float_text(f64::NEG_INFINITY), "null");
    }

    proptest! {
        #[test]
        fn json_quote_round_trips(s in "\\PC*|[\\x00-\\x1f\"\\\\]{0,16}") {
            let quoted = json_quote(&s);
            let parsed: String = serde_json::from_str(&quoted).unwrap();
            prop_assert_eq!(parsed, s);
        }

        #[test]
        fn float_text_round_trips(f in proptest::num::f64::NORMAL) {
            let text = float_text(f);
            let parsed: f64 = text.parse().unwrap();
            prop_assert_eq!(parsed, f);
        }
    }
}
