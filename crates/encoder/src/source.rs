//! Source name resolution
//!
//! The agent groups records by source name. The name comes from the record's
//! tag: patterns are tried in order and the first one that matches yields the
//! matched substring. A tag no pattern matches is its own source name.
//!
//! | patterns | tag | source |
//! |----------|-----|--------|
//! | `^mdsd\.syslog` | `mdsd.syslog.user.info` | `mdsd.syslog` |
//! | `^mdsd\.ext_syslog\.\w+` | `mdsd.ext_syslog.local1.err` | `mdsd.ext_syslog.local1` |
//! | (no match) | `xmdsd.syslog.user.info` | `xmdsd.syslog.user.info` |

use djson_core::{Error, Result};
use regex::Regex;

/// Ordered, compiled tag patterns
#[derive(Debug, Clone, Default)]
pub struct SourcePatterns {
    patterns: Vec<Regex>,
}

impl SourcePatterns {
    /// Compile patterns in order
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` for the first pattern that fails to
    /// compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|e| Error::InvalidPattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SourcePatterns { patterns })
    }

    /// Resolve the source name for a tag
    pub fn resolve<'a>(&self, tag: &'a str) -> &'a str {
        resolve_source_name(tag, &self.patterns)
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no pattern is configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The pattern sources, in order
    pub fn as_strs(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}

/// First pattern match's matched text, or the tag itself
pub fn resolve_source_name<'a>(tag: &'a str, patterns: &[Regex]) -> &'a str {
    patterns
        .iter()
        .find_map(|re| re.find(tag))
        .map(|m| m.as_str())
        .unwrap_or(tag)
}
