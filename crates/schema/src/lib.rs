//! Schema registry for djson
//!
//! Infers the structural schema of each record and deduplicates identical
//! schemas across the stream, assigning each distinct one a stable id.
//!
//! - `Signature`: lookup key derived from field names and wire types
//! - `SchemaRegistry`: concurrent signature → `SchemaEntry` table
//! - `SchemaEntry`: `(id, descriptor)` pair shipped with every record

#![warn(clippy::all)]

pub mod registry;
pub mod signature;

pub use registry::{build_descriptor, SchemaEntry, SchemaRegistry};
pub use signature::Signature;
