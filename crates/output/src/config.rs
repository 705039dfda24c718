//! Output configuration via `djson.toml`
//!
//! Every setting of the output lives in one TOML file. A commented default
//! file can be written on first start and edited afterwards.

use djson_core::{Error, Result, MAX_RECORD_SIZE};
use djson_encoder::{EncoderConfig, SourcePatterns};
use djson_transport::config::{DEFAULT_CONN_RETRY_TIMEOUT, DEFAULT_RESEND_INTERVAL};
use djson_transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "djson.toml";

/// Output configuration loaded from `djson.toml`
///
/// # Example
///
/// ```toml
/// djson_socket = "/var/run/mdsd/default_djson.socket"
/// ack_timeout_ms = 1000
/// tag_regex_patterns = ['^mdsd\.syslog', '^mdsd\.ext_syslog\.\w+']
/// emit_timestamp_name = "FluentdIngestTimestamp"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Full path of the agent's djson socket file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub djson_socket: Option<PathBuf>,
    /// How long an item waits for the agent's ack before it is dropped;
    /// 0 turns off ack tracking and resends
    #[serde(default)]
    pub ack_timeout_ms: u64,
    /// Interval between resends of unacknowledged items (default 30000)
    #[serde(default = "default_resend_interval_ms")]
    pub resend_interval_ms: u64,
    /// How long to keep retrying a failed connection (default 60000)
    #[serde(default = "default_conn_retry_timeout_ms")]
    pub conn_retry_timeout_ms: u64,
    /// Ordered regexes; the first match against a tag is the source name
    #[serde(default)]
    pub tag_regex_patterns: Vec<String>,
    /// Name of the injected emission timestamp field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit_timestamp_name: Option<String>,
    /// Inject the event time (`true`) or wall-clock now (`false`)
    #[serde(default = "default_true")]
    pub use_source_timestamp: bool,
    /// Largest line that may be sent; clamped to 131071
    #[serde(default = "default_max_record_size")]
    pub max_record_size: usize,
    /// Ship mapping values as JSON object text
    #[serde(default)]
    pub convert_hash_to_json: bool,
}

fn default_resend_interval_ms() -> u64 {
    DEFAULT_RESEND_INTERVAL.as_millis() as u64
}

fn default_conn_retry_timeout_ms() -> u64 {
    DEFAULT_CONN_RETRY_TIMEOUT.as_millis() as u64
}

fn default_true() -> bool {
    true
}

fn default_max_record_size() -> usize {
    MAX_RECORD_SIZE
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            djson_socket: None,
            ack_timeout_ms: 0,
            resend_interval_ms: default_resend_interval_ms(),
            conn_retry_timeout_ms: default_conn_retry_timeout_ms(),
            tag_regex_patterns: Vec::new(),
            emit_timestamp_name: None,
            use_source_timestamp: true,
            max_record_size: MAX_RECORD_SIZE,
            convert_hash_to_json: false,
        }
    }
}

impl OutputConfig {
    /// Encoder settings derived from this config
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            emit_timestamp_field: self.emit_timestamp_name.clone(),
            use_source_timestamp: self.use_source_timestamp,
            max_record_size: self.max_record_size,
            hash_to_json: self.convert_hash_to_json,
            tag_patterns: self.tag_regex_patterns.clone(),
        }
    }

    /// Socket transport settings derived from this config
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when `djson_socket` is not set.
    pub fn transport_config(&self) -> Result<TransportConfig> {
        let path = self
            .djson_socket
            .as_ref()
            .ok_or_else(|| Error::config("djson_socket is not set"))?;
        Ok(TransportConfig::with_socket(path)
            .ack_timeout_ms(self.ack_timeout_ms)
            .resend_interval_ms(self.resend_interval_ms)
            .conn_retry_timeout_ms(self.conn_retry_timeout_ms))
    }

    /// Check settings that would otherwise fail later
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` for a pattern that does not compile and
    /// `Error::Config` for a zero record size or an empty timestamp name.
    pub fn validate(&self) -> Result<()> {
        SourcePatterns::new(&self.tag_regex_patterns)?;
        if self.max_record_size == 0 {
            return Err(Error::config("max_record_size must be greater than 0"));
        }
        if matches!(self.emit_timestamp_name.as_deref(), Some("")) {
            return Err(Error::config("emit_timestamp_name must not be empty"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# djson output configuration
#
# Full path of the agent's djson socket file (required unless dry-running)
# djson_socket = "/var/run/mdsd/default_djson.socket"

# Milliseconds an item waits for the agent's ack. Unacknowledged items are
# resent every resend_interval_ms and dropped once older than this.
# 0 turns off ack tracking and resends.
ack_timeout_ms = 0
resend_interval_ms = 30000

# Milliseconds to keep retrying a failed connection, with backoff from
# 100 ms up to 1 minute between attempts. 0 tries once.
conn_retry_timeout_ms = 60000

# Ordered regexes matched against each tag; the first matched substring
# becomes the source name, otherwise the whole tag is used.
# tag_regex_patterns = ['^mdsd\.syslog', '^mdsd\.ext_syslog\.\w+']
tag_regex_patterns = []

# Name of a time field appended to every record (omit to disable)
# emit_timestamp_name = "FluentdIngestTimestamp"

# true = event time of the record, false = time of encoding
use_source_timestamp = true

# Largest encoded record in bytes; larger records are dropped.
# Values above 131071 are clamped.
max_record_size = 131071

# Ship mapping values as JSON object text instead of their plain text form
convert_hash_to_json = false
"#
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OutputConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: OutputConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
