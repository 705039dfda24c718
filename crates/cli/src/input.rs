//! Event readers
//!
//! Each event is an object `{"tag": .., "time": .., "record": {..}}`.
//! JSON input carries one event per line; MessagePack input is a plain
//! concatenation of encoded events.
//!
//! `time` may be integer or fractional epoch seconds, an RFC 3339 string,
//! or `[secs, nanos]`. A missing `time` means now.

use anyhow::{anyhow, bail, Context, Result};
use chrono::DateTime;
use djson_core::{EventTime, Record};
use serde::Deserialize;
use std::io::{BufRead, Cursor, Read};

/// One decoded input event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputEvent {
    /// Routing tag
    pub tag: String,
    #[serde(default)]
    time: Option<serde_json::Value>,
    /// Record fields
    pub record: Record,
}

impl InputEvent {
    /// Event time, defaulting to now
    pub fn event_time(&self) -> Result<EventTime> {
        match &self.time {
            None | Some(serde_json::Value::Null) => Ok(EventTime::now()),
            Some(t) => parse_time(t),
        }
    }

    /// Split into the `(tag, time, record)` triple the output consumes
    pub fn into_entry(self) -> Result<(String, EventTime, Record)> {
        let time = self.event_time()?;
        Ok((self.tag, time, self.record))
    }
}

/// Interpret an event time value
pub fn parse_time(value: &serde_json::Value) -> Result<EventTime> {
    use serde_json::Value as J;
    match value {
        J::Number(n) => {
            if let Some(secs) = n.as_i64() {
                Ok(EventTime::from_secs(secs))
            } else if let Some(secs) = n.as_f64() {
                Ok(EventTime::from_secs_f64(secs))
            } else {
                bail!("time {} is out of range", n)
            }
        }
        J::String(s) => {
            let dt = DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("time '{}' is not RFC 3339", s))?;
            Ok(EventTime::from(dt.with_timezone(&chrono::Utc)))
        }
        J::Array(parts) => match parts.as_slice() {
            [secs, nanos] => {
                let secs = secs.as_i64().ok_or_else(|| anyhow!("time seconds must be an integer"))?;
                let nanos = nanos
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| anyhow!("time nanoseconds must be a u32"))?;
                Ok(EventTime::new(secs, nanos))
            }
            _ => bail!("time array must be [secs, nanos]"),
        },
        other => bail!("unsupported time value {}", other),
    }
}

/// Read newline-delimited JSON events; blank lines are skipped
pub fn read_json_events<R: BufRead>(reader: R) -> Result<Vec<InputEvent>> {
    let mut events = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: InputEvent = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid event", lineno + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Read concatenated MessagePack events
pub fn read_msgpack_events<R: Read>(mut reader: R) -> Result<Vec<InputEvent>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).context("reading input")?;

    let total = bytes.len() as u64;
    let mut cursor = Cursor::new(bytes);
    let mut events = Vec::new();
    while cursor.position() < total {
        let offset = cursor.position();
        let mut de = rmp_serde::Deserializer::new(&mut cursor);
        let event = InputEvent::deserialize(&mut de)
            .with_context(|| format!("offset {}: invalid event", offset))?;
        events.push(event);
    }
    Ok(events)
}
