//! Agent message framing
//!
//! Every line travels as one length-prefixed item:
//!
//! ```text
//! <len>\n["<source>",<msgId>,<schemaId>,<descriptor>,<values>]
//! 37
//! ["syslog",1,1,[["n","FT_INT64"]],[1]]
//! ```
//!
//! `len` is the byte length of the bracketed part. The source name is
//! JSON-escaped. Message ids are assigned per transport, starting at 1.

use djson_core::json_quote;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// One framed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DjsonItem<'a> {
    source: &'a str,
    quoted_source: String,
    msg_id: u64,
    schema_and_data: &'a str,
}

impl<'a> DjsonItem<'a> {
    /// Frame an encoded line
    pub fn new(source: &'a str, msg_id: u64, schema_and_data: &'a str) -> Self {
        DjsonItem {
            source,
            quoted_source: json_quote(source),
            msg_id,
            schema_and_data,
        }
    }

    /// Message id
    pub fn msg_id(&self) -> u64 {
        self.msg_id
    }

    /// Source name
    pub fn source(&self) -> &str {
        self.source
    }

    /// Byte length of the bracketed payload
    pub fn payload_len(&self) -> usize {
        1 + self.quoted_source.len() + 1 + digits(self.msg_id) + 1 + self.schema_and_data.len() + 1
    }

    /// Complete frame including the length header
    pub fn to_frame(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DjsonItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n[{},{},{}]",
            self.payload_len(),
            self.quoted_source,
            self.msg_id,
            self.schema_and_data
        )
    }
}

fn digits(mut n: u64) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// Monotonic message-id source
#[derive(Debug)]
pub struct MessageIds {
    next: AtomicU64,
}

impl MessageIds {
    /// Ids start at 1
    pub fn new() -> Self {
        MessageIds {
            next: AtomicU64::new(1),
        }
    }

    /// Take the next id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MessageIds {
    fn default() -> Self {
        Self::new()
    }
}
