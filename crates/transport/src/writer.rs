//! Transport writing framed items to any `io::Write`

use crate::item::{DjsonItem, MessageIds};
use crate::traits::{Counters, Transport, TransportStats};
use djson_core::{Error, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

/// Writes each framed item followed by a newline
///
/// Used for dry runs (stdout) and for capturing frames into a buffer.
pub struct WriterTransport<W: Write + Send> {
    writer: Mutex<W>,
    ids: MessageIds,
    counters: Counters,
    closed: AtomicBool,
}

impl<W: Write + Send> WriterTransport<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        WriterTransport {
            writer: Mutex::new(writer),
            ids: MessageIds::new(),
            counters: Counters::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> std::fmt::Debug for WriterTransport<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterTransport")
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

impl<W: Write + Send> Transport for WriterTransport<W> {
    fn send(&self, source: &str, payload: &str) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        let item = DjsonItem::new(source, self.ids.next_id(), payload);
        let result = {
            let mut writer = self.writer.lock();
            writeln!(writer, "{}", item).and_then(|_| writer.flush())
        };
        self.counters.track(result.map_err(|e| Error::send_failed(source, e)))
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.writer.lock().flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "writer"
    }

    fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }
}
