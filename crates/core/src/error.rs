//! Error types for djson
//!
//! This module defines the error type shared by every crate in the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Encoding a value never fails; errors come from configuration (bad patterns,
//! unreadable config files) and from the transport handoff.

use std::io;
use thiserror::Error;

/// Result type alias for djson operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for djson
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (socket, config file, input stream)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration is missing, unreadable or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tag-matching regular expression failed to compile
    #[error("Invalid tag pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as configured
        pattern: String,
        /// Compiler diagnostic
        reason: String,
    },

    /// The transport rejected or failed to deliver a message
    #[error("Sending data (source={source_name}) to the agent failed: {reason}")]
    SendFailed {
        /// Resolved source name of the record
        source_name: String,
        /// Underlying failure
        reason: String,
    },

    /// Operation attempted after the output or transport was closed
    #[error("Output is closed")]
    Closed,

    /// Inbound record could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Build a send failure for the given source name
    pub fn send_failed(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::SendFailed {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the error came from the transport handoff
    pub fn is_send_failure(&self) -> bool {
        matches!(self, Error::SendFailed { .. } | Error::Closed)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
