//! Delivery of encoded djson lines to the agent
//!
//! The output pipeline hands every encoded line to a [`Transport`] together
//! with its resolved source name. Implementations frame the line as a
//! [`DjsonItem`] and deliver it.
//!
//! - [`UnixSocketTransport`]: Unix-domain-socket client with ack tracking,
//!   resends and connection retry
//! - [`MemoryTransport`]: captures messages in memory
//! - [`WriterTransport`]: writes framed items to any `io::Write`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ack;
pub mod config;
pub mod item;
pub mod memory;
pub mod traits;
#[cfg(unix)]
pub mod unix;
pub mod writer;

pub use ack::{parse_ack, Ack, AckCache, AckStatus};
pub use config::TransportConfig;
pub use item::{DjsonItem, MessageIds};
pub use memory::{MemoryTransport, SentMessage};
pub use traits::{Counters, Transport, TransportStats};
#[cfg(unix)]
pub use unix::UnixSocketTransport;
pub use writer::WriterTransport;
