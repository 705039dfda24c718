//! The batch-processing output
//!
//! ```text
//! write_batch(entries)
//!   for each (tag, time, record):
//!     1. encode_for_send     (source, prepare, encode, size-check)
//!     2. oversized -> Dropped, warn
//!     3. Transport::send     failure aborts the batch
//! ```

use crate::config::OutputConfig;
use djson_core::{Error, EventTime, Record, Result};
use djson_encoder::{EncodeOutcome, RecordEncoder};
use djson_schema::SchemaRegistry;
use djson_transport::Transport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport
    Sent,
    /// Over the size limit and discarded
    Dropped,
}

/// Per-batch counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records handed to the transport
    pub sent: usize,
    /// Records dropped as oversized
    pub dropped: usize,
}

/// Counters since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Records sent
    pub sent: u64,
    /// Records dropped as oversized
    pub dropped: u64,
    /// Records whose send failed
    pub failed: u64,
    /// Distinct schemas seen
    pub schemas: usize,
}

/// Encodes records and hands them to a transport
pub struct DjsonOutput {
    encoder: RecordEncoder,
    transport: Arc<dyn Transport>,
    sent: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    closed: AtomicBool,
}

impl DjsonOutput {
    /// Create an output with a fresh schema registry
    ///
    /// # Errors
    ///
    /// Returns configuration errors (invalid tag patterns, zero record size).
    pub fn new(config: OutputConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let encoder = RecordEncoder::new(config.encoder_config(), Arc::new(SchemaRegistry::new()))?;
        debug!(
            target: "djson::output",
            transport = transport.name(),
            patterns = encoder.patterns().len(),
            max_record_size = encoder.max_record_size(),
            "Output configured"
        );
        Ok(DjsonOutput {
            encoder,
            transport,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Encode one record and send it
    ///
    /// # Errors
    ///
    /// Returns `Error::SendFailed` if the transport fails and `Error::Closed`
    /// after [`DjsonOutput::close`].
    pub fn handle_record(&self, tag: &str, time: EventTime, record: Record) -> Result<Delivery> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        match self.encoder.encode_for_send(tag, record, time) {
            EncodeOutcome::TooLarge { .. } => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(Delivery::Dropped)
            }
            EncodeOutcome::Ready { source, line } => {
                if let Err(e) = self.transport.send(&source, &line) {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        target: "djson::output",
                        source = %source,
                        transport = self.transport.name(),
                        error = %e,
                        "Send failed"
                    );
                    return Err(match e {
                        Error::Closed => Error::Closed,
                        Error::SendFailed { .. } => e,
                        other => Error::send_failed(source, other),
                    });
                }
                self.sent.fetch_add(1, Ordering::Relaxed);
                trace!(target: "djson::output", source = %source, data = %line, "Sent");
                Ok(Delivery::Sent)
            }
        }
    }

    /// Handle every entry in order
    ///
    /// The first send failure aborts the batch; entries before it stay sent.
    pub fn write_batch<I>(&self, entries: I) -> Result<BatchSummary>
    where
        I: IntoIterator<Item = (String, EventTime, Record)>,
    {
        let mut summary = BatchSummary::default();
        for (tag, time, record) in entries {
            match self.handle_record(&tag, time, record)? {
                Delivery::Sent => summary.sent += 1,
                Delivery::Dropped => summary.dropped += 1,
            }
        }
        Ok(summary)
    }

    /// Current counters
    pub fn stats(&self) -> OutputStats {
        OutputStats {
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            schemas: self.encoder.registry().len(),
        }
    }

    /// The encoder in use
    pub fn encoder(&self) -> &RecordEncoder {
        &self.encoder
    }

    /// Close the transport; later writes fail with `Error::Closed`
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let stats = self.stats();
        debug!(
            target: "djson::output",
            sent = stats.sent,
            dropped = stats.dropped,
            failed = stats.failed,
            schemas = stats.schemas,
            "Closing output"
        );
        self.transport.close()
    }
}

impl std::fmt::Debug for DjsonOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DjsonOutput")
            .field("transport", &self.transport.name())
            .field("stats", &self.stats())
            .finish()
    }
}
