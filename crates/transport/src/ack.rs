//! Agent acknowledgements
//!
//! The agent answers every item with one line `<msgId>[:<status>]\n`.
//! Items wait in an [`AckCache`] keyed by message id until their ack arrives
//! or they grow older than the ack timeout; the resender walks the cache in
//! between.

use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status code carried by an ack line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckStatus {
    /// `0`
    Success,
    /// `1`
    Failed,
    /// `2`
    UnknownSchemaId,
    /// `3`
    DecodeError,
    /// `4`
    InvalidSource,
    /// `5`
    DuplicateSchemaId,
    /// Any other code
    Unknown(String),
}

impl AckStatus {
    /// Decode a status code
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => AckStatus::Success,
            "1" => AckStatus::Failed,
            "2" => AckStatus::UnknownSchemaId,
            "3" => AckStatus::DecodeError,
            "4" => AckStatus::InvalidSource,
            "5" => AckStatus::DuplicateSchemaId,
            other => AckStatus::Unknown(other.to_string()),
        }
    }

    /// True for `ACK_SUCCESS`
    pub fn is_success(&self) -> bool {
        matches!(self, AckStatus::Success)
    }
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckStatus::Success => f.write_str("ACK_SUCCESS"),
            AckStatus::Failed => f.write_str("ACK_FAILED"),
            AckStatus::UnknownSchemaId => f.write_str("ACK_UNKNOWN_SCHEMA_ID"),
            AckStatus::DecodeError => f.write_str("ACK_DECODE_ERROR"),
            AckStatus::InvalidSource => f.write_str("ACK_INVALID_SOURCE"),
            AckStatus::DuplicateSchemaId => f.write_str("ACK_DUPLICATE_SCHEMA_ID"),
            AckStatus::Unknown(code) => write!(f, "Unknown-ACK-CODE({})", code),
        }
    }
}

/// One parsed ack line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Acknowledged message id
    pub msg_id: u64,
    /// Reported status; a bare id means success
    pub status: AckStatus,
}

/// Parse `<msgId>` or `<msgId>:<status>`
pub fn parse_ack(line: &str) -> Option<Ack> {
    let line = line.trim_end_matches('\r');
    let (tag, status) = match line.split_once(':') {
        Some((tag, status)) if !status.is_empty() => (tag, AckStatus::from_code(status)),
        Some(_) => return None,
        None => (line, AckStatus::Success),
    };
    let msg_id = tag.parse().ok()?;
    Some(Ack { msg_id, status })
}

/// Splits a byte stream into ack lines, holding back an unfinished tail
#[derive(Debug, Default)]
pub struct AckLineBuffer {
    partial: Vec<u8>,
}

impl AckLineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every completed, non-empty line
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(bytes);
        let Some(last_newline) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let tail = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, tail);
        complete
            .split(|&b| b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Forget any unfinished tail
    pub fn clear(&mut self) {
        self.partial.clear();
    }

    /// Bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.partial.len()
    }
}

#[derive(Debug, Clone)]
struct CachedFrame {
    frame: Arc<str>,
    sent_at: Instant,
}

/// Frames sent but not yet acknowledged
#[derive(Debug, Default)]
pub struct AckCache {
    entries: DashMap<u64, CachedFrame, BuildHasherDefault<FxHasher>>,
}

impl AckCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a frame as sent now
    pub fn insert(&self, msg_id: u64, frame: Arc<str>) {
        self.entries.insert(
            msg_id,
            CachedFrame {
                frame,
                sent_at: Instant::now(),
            },
        );
    }

    /// Forget a frame; false when it was not cached
    pub fn remove(&self, msg_id: u64) -> bool {
        self.entries.remove(&msg_id).is_some()
    }

    /// True while `msg_id` waits for its ack
    pub fn contains(&self, msg_id: u64) -> bool {
        self.entries.contains_key(&msg_id)
    }

    /// Number of unacknowledged frames
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when every frame was acknowledged or expired
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop frames first sent more than `ack_timeout` before `now`
    ///
    /// Returns the ids dropped, in ascending order.
    pub fn evict_expired(&self, ack_timeout: Duration, now: Instant) -> Vec<u64> {
        let mut expired: Vec<u64> = self
            .entries
            .iter()
            .filter(|e| now.saturating_duration_since(e.value().sent_at) > ack_timeout)
            .map(|e| *e.key())
            .collect();
        expired.retain(|id| self.entries.remove(id).is_some());
        expired.sort_unstable();
        expired
    }

    /// Copy of the cached frames ordered by message id
    pub fn snapshot(&self) -> Vec<(u64, Arc<str>)> {
        let mut frames: Vec<_> = self
            .entries
            .iter()
            .map(|e| (*e.key(), Arc::clone(&e.value().frame)))
            .collect();
        frames.sort_unstable_by_key(|(id, _)| *id);
        frames
    }
}
