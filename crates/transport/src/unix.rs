//! Unix-domain-socket client for the agent
//!
//! ```text
//! send(source, line)
//!   1. frame as DjsonItem, cache it under its msg id (ack tracking on)
//!   2. connect if needed, retrying with backoff up to conn_retry_timeout
//!   3. write the frame; on error drop the connection and uncache
//!
//! ack reader thread     reads "<msgId>[:<status>]" lines, uncaches
//! resender thread       every resend_interval: drop items older than
//!                       ack_timeout, write the rest again
//! ```
//!
//! Both threads start with the first send and stop on `close`.

use crate::ack::{parse_ack, AckCache, AckLineBuffer};
use crate::config::TransportConfig;
use crate::item::{DjsonItem, MessageIds};
use crate::traits::{Counters, Transport, TransportStats};
use djson_core::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Shortest wait between connection attempts
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_millis(100);

/// Longest wait between connection attempts
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// How often the ack reader wakes up to check for shutdown
const READ_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Backoff before connection attempt `attempt + 1`
///
/// Doubles from 100 ms per attempt, wrapping every ten attempts, and never
/// exceeds the remaining retry budget or one minute.
pub fn reconnect_delay(attempt: u64, remaining: Duration) -> Duration {
    let factor = 1u32 << (attempt % 10);
    (MIN_RECONNECT_DELAY * factor)
        .min(MAX_RECONNECT_DELAY)
        .min(remaining)
}

#[derive(Debug)]
struct Connection {
    generation: u64,
    stream: UnixStream,
}

/// State shared by the caller and the worker threads
#[derive(Debug)]
struct Shared {
    config: TransportConfig,
    conn: Mutex<Option<Connection>>,
    conn_ready: Condvar,
    stop_lock: Mutex<()>,
    stop_signal: Condvar,
    stopped: AtomicBool,
    cache: Option<AckCache>,
    counters: Counters,
    generation: AtomicU64,
    connect_attempts: AtomicU64,
}

impl Shared {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sleep for `timeout` or until `close`
    fn sleep_unless_stopped(&self, timeout: Duration) {
        let mut guard = self.stop_lock.lock();
        if !self.is_stopped() {
            self.stop_signal.wait_for(&mut guard, timeout);
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        {
            let _guard = self.stop_lock.lock();
            self.stop_signal.notify_all();
        }
        let taken = {
            let mut conn = self.conn.lock();
            self.conn_ready.notify_all();
            conn.take()
        };
        if let Some(conn) = taken {
            // Peer may already be gone
            let _ = conn.stream.shutdown(Shutdown::Both);
        }
    }

    fn connect_with_retry(&self) -> io::Result<Connection> {
        let start = Instant::now();
        loop {
            let attempt = self.connect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
            match UnixStream::connect(&self.config.socket_path) {
                Ok(stream) => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(
                        target: "djson::transport",
                        socket = %self.config.socket_path.display(),
                        attempt,
                        "Connected to agent socket"
                    );
                    return Ok(Connection { generation, stream });
                }
                Err(e) => {
                    let elapsed = start.elapsed();
                    if self.is_stopped() || elapsed >= self.config.conn_retry_timeout {
                        warn!(
                            target: "djson::transport",
                            socket = %self.config.socket_path.display(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            error = %e,
                            "Connect failed, giving up"
                        );
                        return Err(e);
                    }
                    let delay = reconnect_delay(attempt, self.config.conn_retry_timeout - elapsed);
                    trace!(
                        target: "djson::transport",
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Connect failed, retrying"
                    );
                    self.sleep_unless_stopped(delay);
                }
            }
        }
    }

    fn write_frame(&self, frame: &[u8]) -> io::Result<()> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            if self.is_stopped() {
                return Err(io::ErrorKind::NotConnected.into());
            }
            *guard = Some(self.connect_with_retry()?);
            self.conn_ready.notify_all();
        }
        let conn = match guard.as_mut() {
            Some(conn) => conn,
            None => return Err(io::ErrorKind::NotConnected.into()),
        };

        let result = conn.stream.write_all(frame).and_then(|_| conn.stream.flush());
        if result.is_err() {
            if let Some(conn) = guard.take() {
                let _ = conn.stream.shutdown(Shutdown::Both);
            }
        }
        result
    }

    /// Wait briefly for a connection and hand back a reading handle
    fn reader_handle(&self) -> Option<(u64, UnixStream)> {
        let mut guard = self.conn.lock();
        if guard.is_none() && !self.is_stopped() {
            self.conn_ready.wait_for(&mut guard, READ_POLL_INTERVAL);
        }
        let conn = guard.as_ref()?;
        let stream = match conn.stream.try_clone() {
            Ok(stream) => stream,
            Err(e) => {
                warn!(target: "djson::transport", error = %e, "Cannot clone socket for reading");
                return None;
            }
        };
        if let Err(e) = stream.set_read_timeout(Some(READ_POLL_INTERVAL)) {
            warn!(target: "djson::transport", error = %e, "Cannot set socket read timeout");
        }
        Some((conn.generation, stream))
    }

    /// Drop the connection unless a newer one already replaced it
    fn drop_connection(&self, generation: u64, reason: &dyn std::fmt::Display) {
        let mut guard = self.conn.lock();
        if guard.as_ref().map(|c| c.generation) == Some(generation) {
            if let Some(conn) = guard.take() {
                let _ = conn.stream.shutdown(Shutdown::Both);
            }
            info!(target: "djson::transport", reason = %reason, "Agent connection dropped");
        }
    }

    fn handle_ack_line(&self, line: &str) {
        let Some(ack) = parse_ack(line) else {
            warn!(target: "djson::transport", line, "Malformed ack line");
            return;
        };
        self.counters.record_acked();
        if !ack.status.is_success() {
            error!(
                target: "djson::transport",
                msg_id = ack.msg_id,
                status = %ack.status,
                "Agent rejected item"
            );
        }
        if let Some(cache) = &self.cache {
            if !cache.remove(ack.msg_id) {
                warn!(
                    target: "djson::transport",
                    msg_id = ack.msg_id,
                    "Acked item not found in cache"
                );
            }
        }
    }

    fn run_ack_reader(&self) {
        let mut lines = AckLineBuffer::new();
        let mut buf = [0u8; 512];

        while !self.is_stopped() {
            let Some((generation, mut stream)) = self.reader_handle() else {
                continue;
            };
            lines.clear();

            while !self.is_stopped() {
                match stream.read(&mut buf) {
                    Ok(0) => {
                        self.drop_connection(generation, &"agent closed the connection");
                        break;
                    }
                    Ok(n) => {
                        for line in lines.feed(&buf[..n]) {
                            self.handle_ack_line(&line);
                        }
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::WouldBlock
                                | io::ErrorKind::TimedOut
                                | io::ErrorKind::Interrupted
                        ) => {}
                    Err(e) => {
                        self.drop_connection(generation, &e);
                        break;
                    }
                }
            }
        }
        debug!(target: "djson::transport", "Ack reader stopped");
    }

    fn run_resender(&self, cache: &AckCache, ack_timeout: Duration) {
        let mut rounds = 0u64;
        loop {
            self.sleep_unless_stopped(self.config.resend_interval);
            if self.is_stopped() {
                break;
            }
            self.resend_once(cache, ack_timeout);
            rounds += 1;
        }
        debug!(target: "djson::transport", rounds, "Resender stopped");
    }

    fn resend_once(&self, cache: &AckCache, ack_timeout: Duration) {
        for msg_id in cache.evict_expired(ack_timeout, Instant::now()) {
            trace!(target: "djson::transport", msg_id, "Dropping unacknowledged item");
        }

        for (msg_id, frame) in cache.snapshot() {
            if !cache.contains(msg_id) {
                continue;
            }
            match self.write_frame(frame.as_bytes()) {
                Ok(()) => self.counters.record_resent(),
                Err(e) => {
                    info!(target: "djson::transport", msg_id, error = %e, "Resend failed");
                    break;
                }
            }
        }
    }
}

/// Socket transport with ack tracking
///
/// With an ack timeout configured, every item stays cached until the agent
/// acknowledges it; unacknowledged items are written again each resend
/// interval and dropped once older than the ack timeout. Without one, items
/// are written once and acks are only drained and counted.
///
/// A failed write drops the connection and returns `Error::SendFailed`; the
/// next write reconnects.
#[derive(Debug)]
pub struct UnixSocketTransport {
    shared: Arc<Shared>,
    ids: MessageIds,
    workers: Mutex<Vec<JoinHandle<()>>>,
    started: Once,
}

impl UnixSocketTransport {
    /// Create a transport; no connection is made yet
    pub fn new(config: TransportConfig) -> Self {
        let cache = config.ack_timeout.map(|_| AckCache::new());
        UnixSocketTransport {
            shared: Arc::new(Shared {
                config,
                conn: Mutex::new(None),
                conn_ready: Condvar::new(),
                stop_lock: Mutex::new(()),
                stop_signal: Condvar::new(),
                stopped: AtomicBool::new(false),
                cache,
                counters: Counters::new(),
                generation: AtomicU64::new(0),
                connect_attempts: AtomicU64::new(0),
            }),
            ids: MessageIds::new(),
            workers: Mutex::new(Vec::new()),
            started: Once::new(),
        }
    }

    /// Settings in use
    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    /// True while a connection is held
    pub fn is_connected(&self) -> bool {
        self.shared.conn.lock().is_some()
    }

    /// Items still waiting for their ack
    pub fn pending_acks(&self) -> usize {
        self.shared.cache.as_ref().map_or(0, AckCache::len)
    }

    /// Connection attempts made so far
    pub fn connect_attempts(&self) -> u64 {
        self.shared.connect_attempts.load(Ordering::Relaxed)
    }

    fn start_workers(&self) {
        self.started.call_once(|| {
            let mut workers = self.workers.lock();

            let shared = Arc::clone(&self.shared);
            match thread::Builder::new()
                .name("djson-ack-reader".into())
                .spawn(move || shared.run_ack_reader())
            {
                Ok(handle) => workers.push(handle),
                Err(e) => error!(target: "djson::transport", error = %e, "Cannot start ack reader"),
            }

            if let (Some(_), Some(ack_timeout)) = (&self.shared.cache, self.shared.config.ack_timeout) {
                let shared = Arc::clone(&self.shared);
                match thread::Builder::new()
                    .name("djson-resender".into())
                    .spawn(move || {
                        if let Some(cache) = &shared.cache {
                            shared.run_resender(cache, ack_timeout);
                        }
                    }) {
                    Ok(handle) => workers.push(handle),
                    Err(e) => error!(target: "djson::transport", error = %e, "Cannot start resender"),
                }
            }
        });
    }
}

impl Transport for UnixSocketTransport {
    fn send(&self, source: &str, payload: &str) -> Result<()> {
        if self.shared.is_stopped() {
            return Err(Error::Closed);
        }
        self.start_workers();

        let msg_id = self.ids.next_id();
        let frame: Arc<str> = DjsonItem::new(source, msg_id, payload).to_frame().into();
        if let Some(cache) = &self.shared.cache {
            cache.insert(msg_id, Arc::clone(&frame));
        }

        let result = self.shared.write_frame(frame.as_bytes()).map_err(|e| {
            if let Some(cache) = &self.shared.cache {
                cache.remove(msg_id);
            }
            warn!(
                target: "djson::transport",
                socket = %self.shared.config.socket_path.display(),
                msg_id,
                error = %e,
                "Socket write failed, dropping connection"
            );
            Error::send_failed(source, e)
        });
        self.shared.counters.track(result)
    }

    fn close(&self) -> Result<()> {
        if self.shared.stopped.load(Ordering::Acquire) && self.workers.lock().is_empty() {
            return Ok(());
        }
        self.shared.stop();
        for handle in self.workers.lock().drain(..) {
            if handle.join().is_err() {
                error!(target: "djson::transport", "Transport worker panicked");
            }
        }
        debug!(
            target: "djson::transport",
            pending = self.pending_acks(),
            "Socket transport closed"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "unix-socket"
    }

    fn stats(&self) -> TransportStats {
        self.shared.counters.snapshot()
    }
}

impl Drop for UnixSocketTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
