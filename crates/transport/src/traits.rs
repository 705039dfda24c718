//! Transport abstraction
//!
//! ```text
//! DjsonOutput::handle_record
//!   1. resolve source, encode, size-check
//!   2. Transport::send(source, line)  <- implementation-specific
//!   3. count and log the delivery
//! ```

use djson_core::Result;
use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery of encoded lines to the agent
///
/// Implementations must be `Send + Sync`; one transport is shared by every
/// caller of an output.
pub trait Transport: Send + Sync {
    /// Deliver one encoded djson line under the given source name
    ///
    /// # Errors
    ///
    /// Returns `Error::SendFailed` when the line could not be delivered and
    /// `Error::Closed` after [`Transport::close`]. There is no retry; the
    /// caller decides what a failure means for its batch.
    fn send(&self, source: &str, payload: &str) -> Result<()>;

    /// Release the underlying resources; later sends fail with `Error::Closed`
    fn close(&self) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Delivery counters since creation
    fn stats(&self) -> TransportStats;
}

/// Snapshot of transport counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Messages delivered
    pub sent: u64,
    /// Sends that returned an error
    pub failed: u64,
    /// Cached items written again while waiting for their ack
    pub resent: u64,
    /// Ack lines read back from the agent
    pub acked: u64,
}

/// Lock-free delivery counters shared by the transport implementations
#[derive(Debug, Default)]
pub struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
    resent: AtomicU64,
    acked: AtomicU64,
}

impl Counters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one delivered message
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed send
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one resend
    pub fn record_resent(&self) {
        self.resent.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one ack line
    pub fn record_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values
    pub fn snapshot(&self) -> TransportStats {
        TransportStats {
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            resent: self.resent.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
        }
    }

    /// Count the outcome of a send and pass it through
    pub fn track<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.record_sent(),
            Err(_) => self.record_failed(),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use djson_core::Error;

    #[test]
    fn test_counters_track_outcomes() {
        let counters = Counters::new();
        assert!(counters.track(Ok(())).is_ok());
        assert!(counters.track(Ok(())).is_ok());
        assert!(counters.track::<()>(Err(Error::Closed)).is_err());
        counters.record_acked();
        assert_eq!(
            counters.snapshot(),
            TransportStats {
                sent: 2,
                failed: 1,
                resent: 0,
                acked: 1,
            }
        );
    }

    #[test]
    fn test_transport_is_object_safe() {
        fn assert_dyn(_: Option<&dyn Transport>) {}
        assert_dyn(None);
    }
}
