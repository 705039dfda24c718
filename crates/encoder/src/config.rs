//! Encoder configuration

use djson_core::{clamp_record_size, MAX_RECORD_SIZE};

/// Settings of one `RecordEncoder`
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Name of the emission timestamp field appended to every record.
    /// `None` disables injection.
    pub emit_timestamp_field: Option<String>,
    /// Inject the record's event time (`true`) or wall-clock now (`false`)
    pub use_source_timestamp: bool,
    /// Largest encoded line that may be sent, in bytes
    pub max_record_size: usize,
    /// Ship mapping values as double-encoded JSON objects
    pub hash_to_json: bool,
    /// Ordered tag patterns for source name resolution
    pub tag_patterns: Vec<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            emit_timestamp_field: None,
            use_source_timestamp: true,
            max_record_size: MAX_RECORD_SIZE,
            hash_to_json: false,
            tag_patterns: Vec::new(),
        }
    }
}

impl EncoderConfig {
    /// Set the injected timestamp field name
    pub fn emit_timestamp(mut self, name: impl Into<String>) -> Self {
        self.emit_timestamp_field = Some(name.into());
        self
    }

    /// Choose between source time and wall-clock time
    pub fn use_source_timestamp(mut self, yes: bool) -> Self {
        self.use_source_timestamp = yes;
        self
    }

    /// Set the record size limit
    pub fn max_record_size(mut self, bytes: usize) -> Self {
        self.max_record_size = bytes;
        self
    }

    /// Enable or disable double JSON encoding of maps
    pub fn hash_to_json(mut self, yes: bool) -> Self {
        self.hash_to_json = yes;
        self
    }

    /// Set the ordered tag patterns
    pub fn tag_patterns<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.tag_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// The record size limit after clamping to the protocol ceiling
    pub fn effective_max_record_size(&self) -> usize {
        clamp_record_size(self.max_record_size)
    }
}
