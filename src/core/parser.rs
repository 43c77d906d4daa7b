// svctail - core/parser.rs
//
// Run-log line parsing. Pure: takes one raw line, never touches the
// filesystem. The wire format is owned by the service manager that writes
// run logs: one JSON object per line with the fields Name, Stream, Time and
// Message (Go-style capitalised keys; lower-case keys are accepted too).

use crate::core::model::{LogLine, Stream};
use crate::util::constants::DEBUG_MAX_LINE_PREVIEW;
use crate::util::error::LineParseError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// Deserialisable shape of one run-log record.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Name", alias = "name", default)]
    name: String,
    #[serde(rename = "Stream", alias = "stream")]
    stream: Stream,
    #[serde(rename = "Time", alias = "time")]
    time: DateTime<FixedOffset>,
    #[serde(rename = "Message", alias = "message", default)]
    message: String,
}

/// Parse one raw run-log line into a [`LogLine`].
///
/// The message is returned exactly as written (no trimming). The service
/// name is whatever the record carries, possibly empty; readers overwrite it
/// with their source's name.
///
/// Any line the writer did not produce is an error. Callers treat that as
/// fatal for the source because a line they cannot account for breaks the
/// handoff position between the historical scan and the live follower.
pub fn parse_line(raw: &str) -> Result<LogLine, LineParseError> {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    if raw.trim().is_empty() {
        return Err(LineParseError::Empty);
    }

    let record: RawRecord =
        serde_json::from_str(raw).map_err(|source| LineParseError::Malformed {
            preview: preview(raw),
            source,
        })?;

    Ok(LogLine {
        service_name: record.name,
        stream: record.stream,
        timestamp: record.time.with_timezone(&Utc),
        message: record.message,
    })
}

/// Parse a line and attribute it to `service_name`.
pub fn parse_line_for(service_name: &str, raw: &str) -> Result<LogLine, LineParseError> {
    let mut line = parse_line(raw)?;
    if !service_name.is_empty() {
        line.service_name = service_name.to_string();
    }
    Ok(line)
}

/// Shorten a raw line for inclusion in error messages, on a char boundary.
fn preview(raw: &str) -> String {
    match raw.char_indices().nth(DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}
