//! Socket transport settings

use std::path::PathBuf;
use std::time::Duration;

/// Default interval between resends of unacknowledged items
pub const DEFAULT_RESEND_INTERVAL: Duration = Duration::from_millis(30_000);

/// Default time to keep retrying a failed connection
pub const DEFAULT_CONN_RETRY_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Settings of the socket transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Path of the agent's Unix domain socket
    pub socket_path: PathBuf,
    /// How long a sent item waits for its ack before it is dropped.
    /// `None` turns off the ack cache and the resender.
    pub ack_timeout: Option<Duration>,
    /// Interval between resend rounds over unacknowledged items
    pub resend_interval: Duration,
    /// How long `connect` keeps retrying with backoff; zero tries once
    pub conn_retry_timeout: Duration,
}

impl TransportConfig {
    /// Settings for the given socket path with default timings
    pub fn with_socket(path: impl Into<PathBuf>) -> Self {
        TransportConfig {
            socket_path: path.into(),
            ack_timeout: None,
            resend_interval: DEFAULT_RESEND_INTERVAL,
            conn_retry_timeout: DEFAULT_CONN_RETRY_TIMEOUT,
        }
    }

    /// Set the ack timeout; zero disables ack tracking
    pub fn ack_timeout_ms(mut self, ms: u64) -> Self {
        self.ack_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        self
    }

    /// Set the resend interval; zero is raised to one millisecond
    pub fn resend_interval_ms(mut self, ms: u64) -> Self {
        self.resend_interval = Duration::from_millis(ms.max(1));
        self
    }

    /// Set the connection retry budget
    pub fn conn_retry_timeout_ms(mut self, ms: u64) -> Self {
        self.conn_retry_timeout = Duration::from_millis(ms);
        self
    }
}
