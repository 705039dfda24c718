//! Nanosecond-precision event time
//!
//! Telemetry records carry time instants as whole seconds since the Unix epoch
//! plus a nanosecond remainder. This is also the shape the agent expects on
//! the wire (`[secs,nanos]`), so the type stores exactly those two parts.
//!
//! ```
//! use djson_core::EventTime;
//!
//! let t = EventTime::new(123, 0);
//! assert_eq!(t.secs(), 123);
//! assert_eq!(t.subsec_nanos(), 0);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A point in time as seconds since the Unix epoch plus nanoseconds
///
/// ## Invariants
///
/// - `nanos` is always below one second
/// - Instants before the epoch have negative `secs` and a non-negative `nanos`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTime {
    secs: i64,
    nanos: u32,
}

impl EventTime {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: EventTime = EventTime { secs: 0, nanos: 0 };

    /// Create an event time, carrying whole seconds out of `nanos`
    pub fn new(secs: i64, nanos: u32) -> Self {
        EventTime {
            secs: secs.saturating_add((nanos / NANOS_PER_SEC) as i64),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Create an event time from whole seconds
    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        EventTime { secs, nanos: 0 }
    }

    /// Create an event time from fractional seconds
    ///
    /// Non-finite input maps to the epoch.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() {
            return Self::EPOCH;
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * NANOS_PER_SEC as f64).round() as u32;
        Self::new(whole as i64, nanos)
    }

    /// Wall-clock now
    ///
    /// Returns the epoch if the system clock is before the Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        EventTime {
            secs: duration.as_secs() as i64,
            nanos: duration.subsec_nanos(),
        }
    }

    /// Whole seconds since the Unix epoch
    #[inline]
    pub const fn secs(&self) -> i64 {
        self.secs
    }

    /// Nanosecond remainder
    #[inline]
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Convert to a chrono UTC datetime, if representable
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.secs, self.nanos).single()
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(dt: DateTime<Utc>) -> Self {
        EventTime::new(dt.timestamp(), dt.timestamp_subsec_nanos())
    }
}

impl From<SystemTime> for EventTime {
    fn from(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => EventTime::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let before = e.duration();
                if before.subsec_nanos() == 0 {
                    EventTime::from_secs(-(before.as_secs() as i64))
                } else {
                    EventTime::new(
                        -(before.as_secs() as i64) - 1,
                        NANOS_PER_SEC - before.subsec_nanos(),
                    )
                }
            }
        }
    }
}
