//! In-memory transport

use crate::item::{DjsonItem, MessageIds};
use crate::traits::{Counters, Transport, TransportStats};
use djson_core::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// One captured message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Assigned message id
    pub msg_id: u64,
    /// Source name
    pub source: String,
    /// Encoded djson line
    pub payload: String,
}

impl SentMessage {
    /// The framed form the socket transport would write
    pub fn frame(&self) -> String {
        DjsonItem::new(&self.source, self.msg_id, &self.payload).to_frame()
    }
}

/// Captures every message; can be told to fail
#[derive(Debug, Default)]
pub struct MemoryTransport {
    messages: Mutex<Vec<SentMessage>>,
    ids: MessageIds,
    counters: Counters,
    fail: AtomicBool,
    closed: AtomicBool,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later sends fail (`true`) or succeed (`false`)
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Release);
    }

    /// Copy of every message delivered so far
    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.lock().clone()
    }

    /// Payloads only, in delivery order
    pub fn payloads(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.payload.clone()).collect()
    }

    /// Number of delivered messages
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// True when nothing was delivered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True after `close`
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for MemoryTransport {
    fn send(&self, source: &str, payload: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let result = if self.fail.load(Ordering::Acquire) {
            Err(Error::send_failed(source, "memory transport set to fail"))
        } else {
            self.messages.lock().push(SentMessage {
                msg_id: self.ids.next_id(),
                source: source.to_string(),
                payload: payload.to_string(),
            });
            Ok(())
        };
        self.counters.track(result)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_in_order() {
        let t = MemoryTransport::new();
        t.send("a", "1,[],[]").unwrap();
        t.send("b", "2,[],[]").unwrap();

        let messages = t.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].msg_id, 1);
        assert_eq!(messages[1].source, "b");
        assert_eq!(t.payloads(), vec!["1,[],[]", "2,[],[]"]);
        assert_eq!(messages[0].frame(), "15\n[\"a\",1,1,[],[]]");
    }

    #[test]
    fn test_fail_switch() {
        let t = MemoryTransport::new();
        t.set_fail(true);
        let err = t.send("a", "x").unwrap_err();
        assert!(matches!(err, Error::SendFailed { ref source_name, .. } if source_name == "a"));
        assert!(t.is_empty());

        t.set_fail(false);
        t.send("a", "x").unwrap();
        let stats = t.stats();
        assert_eq!((stats.sent, stats.failed), (1, 1));
        assert_eq!(stats, TransportStats { sent: 1, failed: 1, ..Default::default() });
    }

    #[test]
    fn test_send_after_close() {
        let t = MemoryTransport::new();
        t.close().unwrap();
        assert!(matches!(t.send("a", "x"), Err(Error::Closed)));
    }
}
