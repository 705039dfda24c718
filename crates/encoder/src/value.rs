//! Per-value wire rendering
//!
//! | kind | rendering |
//! |------|-----------|
//! | String | JSON string, control characters escaped |
//! | Time | `[secs,nanos]`, unquoted |
//! | Bool, Int, UInt, Float | plain text, unquoted |
//! | Array, Map, Bytes | stringified form, JSON-quoted |
//! | Map with `hash_to_json` | JSON object text, JSON-quoted |
//! | Null | the string `"null"` |
//!
//! Null renders as a quoted string, not a JSON `null` token. Consumers of the
//! stream already expect that text literal for absent fields.

use djson_core::value::base64_text;
use djson_core::{float_text, json_quote, Value};
use std::fmt::Write;

/// Render one value in wire form
pub fn encode_value(value: &Value, hash_to_json: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, value, hash_to_json);
    out
}

/// Append one value in wire form to `out`
pub fn write_value(out: &mut String, value: &Value, hash_to_json: bool) {
    match value {
        Value::String(s) => out.push_str(&json_quote(s)),
        Value::Time(t) => {
            let _ = write!(out, "[{},{}]", t.secs(), t.subsec_nanos());
        }
        Value::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        Value::UInt(u) => {
            let _ = write!(out, "{}", u);
        }
        Value::Float(f) => out.push_str(&float_text(*f)),
        Value::Null => out.push_str(&json_quote("null")),
        Value::Bytes(b) => out.push_str(&json_quote(&base64_text(b))),
        Value::Map(_) if hash_to_json => out.push_str(&json_quote(&value.to_json().to_string())),
        Value::Array(_) | Value::Map(_) => out.push_str(&json_quote(&value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use djson_core::EventTime;

    #[test]
    fn test_scalars_unquoted() {
        assert_eq!(encode_value(&Value::Bool(true), false), "true");
        assert_eq!(encode_value(&Value::Bool(false), false), "false");
        assert_eq!(encode_value(&Value::Int(1234), false), "1234");
        assert_eq!(encode_value(&Value::Int(-7), false), "-7");
        assert_eq!(encode_value(&Value::UInt(u64::MAX), false), "18446744073709551615");
        assert_eq!(encode_value(&Value::Float(3.14), false), "3.14");
    }

    #[test]
    fn test_string_quoted() {
        assert_eq!(encode_value(&"stringdata".into(), false), r#""stringdata""#);
        assert_eq!(encode_value(&"A\"B".into(), false), r#""A\"B""#);
    }

    #[test]
    fn test_time_is_array() {
        assert_eq!(encode_value(&Value::Time(EventTime::from_secs(123)), false), "[123,0]");
        assert_eq!(encode_value(&Value::Time(EventTime::from_secs(100)), false), "[100,0]");
        assert_eq!(
            encode_value(&Value::Time(EventTime::new(1478626843, 878947000)), false),
            "[1478626843,878947000]"
        );
    }

    #[test]
    fn test_null_is_quoted_text() {
        assert_eq!(encode_value(&Value::Null, false), r#""null""#);
        assert_eq!(encode_value(&Value::Null, true), r#""null""#);
    }

    #[test]
    fn test_composites_stringified_and_quoted() {
        assert_eq!(encode_value(&Value::Array(vec![Value::Int(1)]), false), r#""[1]""#);
        assert_eq!(
            encode_value(&Value::Array(vec![Value::Int(1), Value::Int(2)]), false),
            r#""[1, 2]""#
        );
        assert_eq!(
            encode_value(&Value::Array(vec!["a".into()]), false),
            r#""[\"a\"]""#
        );
        assert_eq!(
            encode_value(&Value::Map(vec![(Value::Int(1), Value::Int(2))]), false),
            r#""{1: 2}""#
        );
    }

    #[test]
    fn test_hash_to_json_double_encodes_maps() {
        let m = Value::Map(vec![("k".into(), "v".into()), ("n".into(), Value::Int(1))]);
        assert_eq!(encode_value(&m, true), r#""{\"k\":\"v\",\"n\":1}""#);

        let decoded: String = serde_json::from_str(&encode_value(&m, true)).unwrap();
        let inner: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(inner, serde_json::json!({"k": "v", "n": 1}));
    }

    #[test]
    fn test_hash_to_json_leaves_arrays_alone() {
        let a = Value::Array(vec![Value::Int(1)]);
        assert_eq!(encode_value(&a, true), encode_value(&a, false));
    }

    #[test]
    fn test_bytes_are_base64_text() {
        assert_eq!(encode_value(&Value::Bytes(b"ABC".to_vec()), false), r#""QUJD""#);
    }

    #[test]
    fn test_control_characters_round_trip() {
        for input in ["hello\u{0000}world", "data\u{0001}\u{0002}\u{0003}end", "tab\there\r\n"] {
            let encoded = encode_value(&input.into(), false);
            let parsed: String = serde_json::from_str(&encoded).unwrap();
            assert_eq!(parsed, input);
        }
    }
}
