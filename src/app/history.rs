// svctail - app/history.rs
//
// Historical scan: reads everything a run log holds at session start,
// exactly once, and records where the live follower must pick up.
//
// Rules:
//   - Every complete (newline-terminated) line is parsed; the first failure
//     aborts the scan. A partial scan would leave the handoff position
//     untrusted, so there is no "skip bad line" mode.
//   - A trailing fragment without a newline is a line still being written.
//     It is neither parsed nor counted; `end_offset` stops before it and the
//     live follower delivers it once it is complete.
//   - No retries and no timestamp filtering. The file handle is dropped on
//     every return path.

use crate::core::model::{LogLine, LogSource};
use crate::core::parser;
use crate::util::error::HistoryError;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Result of scanning one run log.
#[derive(Debug)]
pub struct HistorySnapshot {
    /// Parsed lines in file order.
    pub entries: Vec<LogLine>,
    /// Number of raw lines consumed, for line-count handoff.
    pub lines_consumed: u64,
    /// Byte offset just past the last consumed line, for offset handoff.
    pub end_offset: u64,
}

/// Scan the run log of `source` from the beginning to its current end.
pub fn read_history(source: &LogSource) -> Result<HistorySnapshot, HistoryError> {
    let file = File::open(&source.path).map_err(|e| HistoryError::Open {
        path: source.path.clone(),
        source: e,
    })?;

    let snapshot = read_history_from(BufReader::new(file), source)?;

    tracing::debug!(
        service = %source.service_name,
        file = %source.path.display(),
        lines = snapshot.lines_consumed,
        offset = snapshot.end_offset,
        "History scanned"
    );

    Ok(snapshot)
}

/// Scan an already-open reader on behalf of `source`.
pub fn read_history_from<R: BufRead>(
    mut reader: R,
    source: &LogSource,
) -> Result<HistorySnapshot, HistoryError> {
    let mut entries = Vec::new();
    let mut lines_consumed: u64 = 0;
    let mut end_offset: u64 = 0;
    let mut buf: Vec<u8> = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| HistoryError::Read {
                path: source.path.clone(),
                line_number: lines_consumed + 1,
                source: e,
            })?;

        if n == 0 {
            break;
        }

        if buf.last() != Some(&b'\n') {
            tracing::debug!(
                file = %source.path.display(),
                bytes = n,
                "Unterminated trailing line left for the live follower"
            );
            break;
        }

        lines_consumed += 1;
        end_offset += n as u64;

        let text = String::from_utf8_lossy(&buf[..n - 1]);
        let line = parser::parse_line_for(&source.service_name, &text).map_err(|e| {
            HistoryError::Parse {
                path: source.path.clone(),
                line_number: lines_consumed,
                source: e,
            }
        })?;
        entries.push(line);
    }

    Ok(HistorySnapshot {
        entries,
        lines_consumed,
        end_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Stream;
    use crate::util::error::LineParseError;
    use std::io::Cursor;

    fn record(secs: u32, message: &str) -> String {
        format!(
            "{{\"Name\":\"other\",\"Time\":\"2024-01-15T10:00:{secs:02}Z\",\"Stream\":\"stdout\",\"Message\":\"{message}\"}}\n"
        )
    }

    fn source() -> LogSource {
        LogSource::new("api", "/logs/api.log")
    }

    #[test]
    fn test_reads_all_complete_lines() {
        let content = format!("{}{}{}", record(1, "a"), record(2, "b"), record(3, "c"));
        let snapshot = read_history_from(Cursor::new(content.clone()), &source()).unwrap();

        assert_eq!(snapshot.lines_consumed, 3);
        assert_eq!(snapshot.end_offset, content.len() as u64);
        let messages: Vec<_> = snapshot.entries.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["a", "b", "c"]);
    }

    #[test]
    fn test_entries_are_attributed_to_the_source() {
        let snapshot = read_history_from(Cursor::new(record(1, "a")), &source()).unwrap();
        assert_eq!(snapshot.entries[0].service_name, "api");
        assert_eq!(snapshot.entries[0].stream, Stream::Stdout);
    }

    #[test]
    fn test_blank_message_lines_are_counted() {
        let content = format!(
            "{}{}{}{}{}",
            record(1, "a"),
            record(2, "   "),
            record(3, "c"),
            record(4, "d"),
            record(5, "e")
        );
        let snapshot = read_history_from(Cursor::new(content), &source()).unwrap();
        assert_eq!(snapshot.lines_consumed, 5);
        assert_eq!(snapshot.entries.len(), 5);
    }

    #[test]
    fn test_unterminated_fragment_is_not_consumed() {
        let complete = record(1, "a");
        let fragment = "{\"Name\":\"api\",\"Time\":\"2024-01";
        let content = format!("{complete}{fragment}");

        let snapshot = read_history_from(Cursor::new(content), &source()).unwrap();

        assert_eq!(snapshot.lines_consumed, 1);
        assert_eq!(snapshot.end_offset, complete.len() as u64);
        assert_eq!(snapshot.entries.len(), 1);
    }

    #[test]
    fn test_unparsable_line_aborts_scan() {
        let content = format!("{}not json\n{}", record(1, "a"), record(3, "c"));
        let result = read_history_from(Cursor::new(content), &source());

        match result {
            Err(HistoryError::Parse {
                line_number,
                source: LineParseError::Malformed { .. },
                ..
            }) => assert_eq!(line_number, 2),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_raw_line_aborts_scan() {
        let content = format!("{}\n", record(1, "a"));
        let result = read_history_from(Cursor::new(content), &source());
        assert!(matches!(
            result,
            Err(HistoryError::Parse {
                line_number: 2,
                source: LineParseError::Empty,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        let snapshot = read_history_from(Cursor::new(Vec::new()), &source()).unwrap();
        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.lines_consumed, 0);
        assert_eq!(snapshot.end_offset, 0);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = LogSource::new("ghost", dir.path().join("ghost.log"));
        assert!(matches!(
            read_history(&missing),
            Err(HistoryError::Open { .. })
        ));
    }
}
