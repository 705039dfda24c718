//! Schema registry
//!
//! The registry memoizes signature → schema. The first time a signature is
//! seen it mints the next id and builds the descriptor text; every later
//! lookup returns the same entry untouched.
//!
//! ## Usage
//!
//! ```
//! use djson_core::Record;
//! use djson_schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::new();
//! let entry = registry.get_schema(&Record::new().with("n", 1));
//!
//! assert_eq!(entry.id(), 1);
//! assert_eq!(entry.descriptor(), r#"[["n","FT_INT64"]]"#);
//! assert_eq!(registry.len(), 1);
//! ```
//!
//! ## Concurrency
//!
//! Flush workers share one registry. Lookups of known signatures take a
//! shard read lock only. A miss re-checks under the shard write lock through
//! the entry API, so two callers racing on the same new signature mint one id
//! between them and both get the winner's entry. Ids are reserved under that
//! lock from an atomic counter, which keeps them contiguous from 1.

use crate::signature::Signature;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use djson_core::{json_quote, Record, WireType};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// One distinct record shape
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    id: u64,
    descriptor: String,
}

impl SchemaEntry {
    /// Schema id, unique within its registry
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Descriptor text: `[["name","FT_TYPE"],...]`, optionally with a leading
    /// timestamp field index
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

/// Registry of distinct schemas for one encoder
pub struct SchemaRegistry {
    table: DashMap<Signature, Arc<SchemaEntry>, FxBuildHasher>,
    /// Last id handed out; 0 before the first schema
    last_id: AtomicU64,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        SchemaRegistry {
            table: DashMap::with_hasher(FxBuildHasher::default()),
            last_id: AtomicU64::new(0),
        }
    }

    /// Schema of a record without an injected timestamp field
    pub fn get_schema(&self, record: &Record) -> Arc<SchemaEntry> {
        self.get_schema_with_time_index(record, None)
    }

    /// Schema of a record
    ///
    /// `time_index` is the position of the injected emission timestamp field,
    /// if any; it is written at the head of the descriptor.
    pub fn get_schema_with_time_index(
        &self,
        record: &Record,
        time_index: Option<usize>,
    ) -> Arc<SchemaEntry> {
        let signature = Signature::of(record, time_index);

        if let Some(existing) = self.table.get(&signature) {
            return Arc::clone(existing.value());
        }

        match self.table.entry(signature) {
            Entry::Occupied(e) => Arc::clone(e.get()),
            Entry::Vacant(v) => {
                let id = self.last_id.fetch_add(1, Ordering::AcqRel) + 1;
                let entry = Arc::new(SchemaEntry {
                    id,
                    descriptor: build_descriptor(record, time_index),
                });
                debug!(
                    target: "djson::schema",
                    id,
                    descriptor = %entry.descriptor,
                    "Registered new schema"
                );
                v.insert(Arc::clone(&entry));
                entry
            }
        }
    }

    /// Check whether a signature is already registered
    pub fn contains(&self, signature: &Signature) -> bool {
        self.table.contains_key(signature)
    }

    /// Number of distinct schemas registered so far
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True before the first schema is registered
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schema_count", &self.table.len())
            .field("last_id", &self.last_id.load(Ordering::Acquire))
            .finish()
    }
}

/// Descriptor text for a record's fields
pub fn build_descriptor(record: &Record, time_index: Option<usize>) -> String {
    let mut out = String::with_capacity(2 + record.len() * 24);
    out.push('[');
    if let Some(idx) = time_index {
        out.push_str(&idx.to_string());
        if !record.is_empty() {
            out.push(',');
        }
    }
    for (i, (name, value)) in record.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('[');
        out.push_str(&json_quote(name));
        out.push_str(",\"");
        out.push_str(WireType::of(value).as_str());
        out.push_str("\"]");
    }
    out.push(']');
    out
}
