//! Record encoder
//!
//! Turns one record into one djson line:
//!
//! ```text
//! <schemaId>,<descriptor>,[<value>,<value>,...]
//! 1,[["n","FT_INT64"]],[1]
//! ```
//!
//! ## Send path
//!
//! ```text
//!   1. resolve source name from the tag
//!   2. append the emission timestamp field (if configured)
//!   3. look up (id, descriptor) in the registry
//!   4. render values
//!   5. drop the line if it exceeds max_record_size
//! ```
//!
//! Encoding itself never fails; only configuration (tag patterns) can.

use crate::config::EncoderConfig;
use crate::source::SourcePatterns;
use crate::value::write_value;
use djson_core::{EventTime, Record, Result, Value};
use djson_schema::SchemaRegistry;
use std::sync::Arc;
use tracing::warn;

/// Result of preparing one record for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// Line fits; hand it to the transport under `source`
    Ready {
        /// Resolved source name
        source: String,
        /// Encoded djson line
        line: String,
    },
    /// Line exceeds the size limit and must not be sent
    TooLarge {
        /// Resolved source name
        source: String,
        /// Encoded size in bytes
        size: usize,
        /// Configured (clamped) limit
        limit: usize,
    },
}

/// Encodes records against a shared schema registry
#[derive(Debug)]
pub struct RecordEncoder {
    registry: Arc<SchemaRegistry>,
    patterns: SourcePatterns,
    emit_timestamp_field: Option<String>,
    use_source_timestamp: bool,
    max_record_size: usize,
    hash_to_json: bool,
}

impl RecordEncoder {
    /// Create an encoder
    ///
    /// `max_record_size` is clamped to the protocol ceiling.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if a tag pattern does not compile.
    pub fn new(config: EncoderConfig, registry: Arc<SchemaRegistry>) -> Result<Self> {
        let patterns = SourcePatterns::new(&config.tag_patterns)?;
        let max_record_size = config.effective_max_record_size();
        Ok(RecordEncoder {
            registry,
            patterns,
            emit_timestamp_field: config.emit_timestamp_field,
            use_source_timestamp: config.use_source_timestamp,
            max_record_size,
            hash_to_json: config.hash_to_json,
        })
    }

    /// Create an encoder with its own fresh registry
    pub fn with_fresh_registry(config: EncoderConfig) -> Result<Self> {
        Self::new(config, Arc::new(SchemaRegistry::new()))
    }

    /// Append the emission timestamp as the record's last field
    ///
    /// Holds `event_time` when source timestamps are in use, wall-clock now
    /// otherwise. A field already carrying that name is moved to the end.
    /// Does nothing when no timestamp field is configured.
    pub fn prepare_record(&self, record: &mut Record, event_time: EventTime) {
        if let Some(name) = &self.emit_timestamp_field {
            let ts = if self.use_source_timestamp {
                event_time
            } else {
                EventTime::now()
            };
            record.push_last(name.as_str(), Value::Time(ts));
        }
    }

    /// Encode a record as `<id>,<descriptor>,<values>`
    pub fn encode(&self, record: &Record) -> String {
        let entry = self
            .registry
            .get_schema_with_time_index(record, self.time_field_index(record));

        let mut line = String::with_capacity(entry.descriptor().len() + record.len() * 16 + 8);
        line.push_str(&entry.id().to_string());
        line.push(',');
        line.push_str(entry.descriptor());
        line.push_str(",[");
        for (i, value) in record.values().enumerate() {
            if i > 0 {
                line.push(',');
            }
            write_value(&mut line, value, self.hash_to_json);
        }
        line.push(']');
        line
    }

    /// Render one value in wire form
    pub fn encode_value(&self, value: &Value) -> String {
        crate::value::encode_value(value, self.hash_to_json)
    }

    /// Source name for a tag
    pub fn resolve_source_name<'a>(&self, tag: &'a str) -> &'a str {
        self.patterns.resolve(tag)
    }

    /// True when an encoded line exceeds the size limit
    pub fn too_large(&self, encoded: &str) -> bool {
        encoded.len() > self.max_record_size
    }

    /// Resolve, prepare, encode and size-check one record
    ///
    /// Oversized lines are reported at warn level and returned as
    /// `EncodeOutcome::TooLarge`; they must not be sent.
    pub fn encode_for_send(
        &self,
        tag: &str,
        mut record: Record,
        event_time: EventTime,
    ) -> EncodeOutcome {
        let source = self.resolve_source_name(tag).to_string();
        self.prepare_record(&mut record, event_time);
        let line = self.encode(&record);

        if self.too_large(&line) {
            warn!(
                target: "djson::encoder",
                source = %source,
                size = line.len(),
                limit = self.max_record_size,
                "Dropping record larger than max_record_size"
            );
            return EncodeOutcome::TooLarge {
                source,
                size: line.len(),
                limit: self.max_record_size,
            };
        }

        EncodeOutcome::Ready { source, line }
    }

    /// Effective (clamped) size limit
    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// The registry this encoder resolves schemas with
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The compiled tag patterns
    pub fn patterns(&self) -> &SourcePatterns {
        &self.patterns
    }

    fn time_field_index(&self, record: &Record) -> Option<usize> {
        let name = self.emit_timestamp_field.as_deref()?;
        let (last, value) = record.iter().last()?;
        (last == name && matches!(value, Value::Time(_))).then(|| record.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use djson_core::MAX_RECORD_SIZE;

    fn encoder(config: EncoderConfig) -> RecordEncoder {
        RecordEncoder::with_fresh_registry(config).unwrap()
    }

    #[test]
    fn test_first_record_end_to_end() {
        let enc = encoder(EncoderConfig::default());
        let line = enc.encode(&Record::new().with("n", 1));
        assert_eq!(line, r#"1,[["n","FT_INT64"]],[1]"#);
    }

    #[test]
    fn test_all_scalar_kinds() {
        let enc = encoder(EncoderConfig::default());
        let record = Record::new()
            .with("truekey", true)
            .with("falsekey", false)
            .with("intkey", 1234)
            .with("floatkey", 3.14)
            .with("timekey", EventTime::new(1478626843, 878947000))
            .with("strkey", "teststring");
        assert_eq!(
            enc.encode(&record),
            r#"1,[["truekey","FT_BOOL"],["falsekey","FT_BOOL"],["intkey","FT_INT64"],["floatkey","FT_DOUBLE"],["timekey","FT_TIME"],["strkey","FT_STRING"]],[true,false,1234,3.14,[1478626843,878947000],"teststring"]"#
        );
    }

    #[test]
    fn test_quote_escape() {
        let enc = encoder(EncoderConfig::default());
        let record = Record::new()
            .with("dquotekey", "A\"B")
            .with("arraykey", Value::Array(vec!["a".into()]));
        assert_eq!(
            enc.encode(&record),
            r#"1,[["dquotekey","FT_STRING"],["arraykey","FT_STRING"]],["A\"B","[\"a\"]"]"#
        );
    }

    #[test]
    fn test_prepare_record_appends_source_time() {
        let enc = encoder(EncoderConfig::default().emit_timestamp("emittime"));
        let mut record = Record::new()
            .with("arraykey", Value::Array(vec![Value::Int(1)]))
            .with("hashkey", Value::Map(vec![(Value::Int(1), Value::Int(2))]));
        enc.prepare_record(&mut record, EventTime::from_secs(123));

        assert_eq!(record.len(), 3);
        assert_eq!(
            enc.encode(&record),
            r#"1,[2,["arraykey","FT_STRING"],["hashkey","FT_STRING"],["emittime","FT_TIME"]],["[1]","{1: 2}",[123,0]]"#
        );
    }

    #[test]
    fn test_prepare_record_wall_clock() {
        let enc = encoder(
            EncoderConfig::default()
                .emit_timestamp("ts")
                .use_source_timestamp(false),
        );
        let before = EventTime::now();
        let mut record = Record::new().with("m", "x");
        enc.prepare_record(&mut record, EventTime::from_secs(1));
        let injected = record.get("ts").and_then(Value::as_time).unwrap();
        assert!(injected >= before);
    }

    #[test]
    fn test_prepare_record_moves_existing_field_last() {
        let enc = encoder(EncoderConfig::default().emit_timestamp("ts"));
        let mut record = Record::new().with("ts", "old").with("m", "x");
        enc.prepare_record(&mut record, EventTime::from_secs(5));
        let names: Vec<_> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["m", "ts"]);
        assert!(enc.encode(&record).starts_with(r#"1,[1,["m","FT_STRING"],["ts","FT_TIME"]]"#));
    }

    #[test]
    fn test_prepare_record_without_field_is_noop() {
        let enc = encoder(EncoderConfig::default());
        let mut record = Record::new().with("m", "x");
        enc.prepare_record(&mut record, EventTime::from_secs(5));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_null_field_quirk() {
        let enc = encoder(EncoderConfig::default());
        let line = enc.encode(&Record::new().with("absent", Value::Null));
        assert_eq!(line, r#"1,[["absent","FT_STRING"]],["null"]"#);
    }

    #[test]
    fn test_non_finite_floats_are_json_null() {
        let enc = encoder(EncoderConfig::default());
        let record = Record::new()
            .with("nan", f64::NAN)
            .with("inf", f64::INFINITY)
            .with("ninf", f64::NEG_INFINITY)
            .with("ok", 0.5);
        let line = enc.encode(&record);
        assert_eq!(
            line,
            r#"1,[["nan","FT_DOUBLE"],["inf","FT_DOUBLE"],["ninf","FT_DOUBLE"],["ok","FT_DOUBLE"]],[null,null,null,0.5]"#
        );

        // The column keeps its FT_DOUBLE type and the line stays valid JSON
        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&format!("[{}]", line)).unwrap();
        assert!(parsed[2][0].is_null());
        assert_eq!(parsed[2][3], serde_json::json!(0.5));
    }

    #[test]
    fn test_schema_reused_across_records() {
        let enc = encoder(EncoderConfig::default());
        let a = enc.encode(&Record::new().with("n", 1));
        let b = enc.encode(&Record::new().with("s", "str"));
        let c = enc.encode(&Record::new().with("n", 2));
        assert!(a.starts_with("1,"));
        assert!(b.starts_with("2,"));
        assert_eq!(c, r#"1,[["n","FT_INT64"]],[2]"#);
        assert_eq!(enc.registry().len(), 2);
    }

    #[test]
    fn test_too_large() {
        let enc = encoder(EncoderConfig::default().max_record_size(10));
        assert!(!enc.too_large("0123456789"));
        assert!(enc.too_large("0123456789A"));
    }

    #[test]
    fn test_oversized_limit_is_clamped() {
        let enc = encoder(EncoderConfig::default().max_record_size(10 * MAX_RECORD_SIZE));
        assert_eq!(enc.max_record_size(), MAX_RECORD_SIZE);
        let exactly = "x".repeat(MAX_RECORD_SIZE);
        assert!(!enc.too_large(&exactly));
        assert!(enc.too_large(&format!("{}x", exactly)));
    }

    #[test]
    fn test_encode_for_send_ready() {
        let enc = encoder(EncoderConfig::default().tag_patterns([r"^mdsd\.syslog"]));
        let outcome = enc.encode_for_send(
            "mdsd.syslog.user.info",
            Record::new().with("n", 1),
            EventTime::EPOCH,
        );
        assert_eq!(
            outcome,
            EncodeOutcome::Ready {
                source: "mdsd.syslog".to_string(),
                line: r#"1,[["n","FT_INT64"]],[1]"#.to_string(),
            }
        );
    }

    #[test]
    fn test_encode_for_send_too_large() {
        let enc = encoder(EncoderConfig::default().max_record_size(16));
        let outcome = enc.encode_for_send(
            "app",
            Record::new().with("msg", "x".repeat(64)),
            EventTime::EPOCH,
        );
        match outcome {
            EncodeOutcome::TooLarge { source, size, limit } => {
                assert_eq!(source, "app");
                assert!(size > 16);
                assert_eq!(limit, 16);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let result = RecordEncoder::with_fresh_registry(
            EncoderConfig::default().tag_patterns(["[unterminated"]),
        );
        assert!(result.is_err());
    }
}
