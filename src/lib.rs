//! djson - schema-caching encoder for shipping telemetry records to a local
//! monitoring agent
//!
//! Records are flat, ordered collections of named values. Each record is
//! encoded as one djson line: a numeric schema id, the schema descriptor
//! (field names and wire types) and the value array. Identical record shapes
//! share one schema id for the life of the process.
//!
//! # Quick Start
//!
//! ```
//! use djson::{DjsonOutput, EventTime, MemoryTransport, OutputConfig, Record};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(MemoryTransport::new());
//! let output = DjsonOutput::new(OutputConfig::default(), transport.clone()).unwrap();
//!
//! output
//!     .handle_record("app.log", EventTime::from_secs(100), Record::new().with("n", 1))
//!     .unwrap();
//! assert_eq!(transport.payloads(), vec![r#"1,[["n","FT_INT64"]],[1]"#]);
//! ```
//!
//! # Architecture
//!
//! ```text
//! djson-output     DjsonOutput, OutputConfig (djson.toml)
//!   djson-encoder  RecordEncoder, source patterns, value rendering
//!     djson-schema SchemaRegistry, Signature
//!       djson-core Value, Record, EventTime, WireType, Error
//!   djson-transport Transport, DjsonItem framing, socket client
//! ```

pub use djson_core::{Error, EventTime, Record, Result, Value, WireType, MAX_RECORD_SIZE};
pub use djson_encoder::{EncodeOutcome, EncoderConfig, RecordEncoder, SourcePatterns};
pub use djson_output::{BatchSummary, Delivery, DjsonOutput, OutputConfig, OutputStats};
pub use djson_schema::{SchemaEntry, SchemaRegistry};
pub use djson_transport::{DjsonItem, MemoryTransport, Transport, TransportConfig, WriterTransport};

#[cfg(unix)]
pub use djson_transport::UnixSocketTransport;
