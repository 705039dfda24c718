//! djson output pipeline
//!
//! Ties the encoder to a transport: [`DjsonOutput`] takes batches of
//! `(tag, time, record)` entries, encodes each one and hands it to the agent.
//! Settings come from [`OutputConfig`], usually read from `djson.toml`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod output;

pub use config::{OutputConfig, CONFIG_FILE_NAME};
pub use output::{BatchSummary, Delivery, DjsonOutput, OutputStats};
