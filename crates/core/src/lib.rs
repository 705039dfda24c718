//! Core types for djson
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: closed tagged union over record value kinds
//! - Record: ordered field name → value mapping
//! - EventTime: seconds + nanoseconds time instant
//! - WireType: the agent's FT_* value categories, plus JSON text helpers
//! - Limits: protocol ceiling on encoded record size
//! - Error: Error type shared by every crate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod record;
pub mod time;
pub mod value;
pub mod wire;

pub use error::{Error, Result};
pub use limits::{clamp_record_size, MAX_RECORD_SIZE};
pub use record::Record;
pub use time::EventTime;
pub use value::Value;
pub use wire::{float_text, json_quote, WireType};
