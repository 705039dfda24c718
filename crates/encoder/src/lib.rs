//! djson record encoder
//!
//! Renders records into djson lines against a shared `SchemaRegistry`,
//! resolves source names from tags and enforces the record size limit.
//!
//! ```
//! use djson_core::Record;
//! use djson_encoder::{EncoderConfig, RecordEncoder};
//!
//! let encoder = RecordEncoder::with_fresh_registry(EncoderConfig::default()).unwrap();
//! let line = encoder.encode(&Record::new().with("n", 1));
//! assert_eq!(line, r#"1,[["n","FT_INT64"]],[1]"#);
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod encoder;
pub mod source;
pub mod value;

pub use config::EncoderConfig;
pub use encoder::{EncodeOutcome, RecordEncoder};
pub use source::{resolve_source_name, SourcePatterns};
pub use value::encode_value;
