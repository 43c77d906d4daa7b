// svctail - app/present.rs
//
// Plain-text presentation of aggregated lines. One output line per log
// line: the trimmed message, optionally prefixed with its service label.

use crate::core::model::{LogLine, Stream};
use crate::util::constants::{LOGS_BANNER, MESSAGES_LABEL};
use std::io::{self, Write};

/// Writes log lines to an output sink.
pub struct Presenter<W: Write> {
    out: W,
    /// Prefix each line with its service name (more than one service selected).
    label_sources: bool,
    emitted: u64,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, label_sources: bool) -> Self {
        Self {
            out,
            label_sources,
            emitted: 0,
        }
    }

    /// Print the banner shown before the historical replay.
    pub fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "{LOGS_BANNER}")
    }

    /// Write one line. Returns `Ok(false)` if it was dropped because its
    /// message is blank after trimming.
    pub fn emit(&mut self, line: &LogLine) -> io::Result<bool> {
        let message = line.message.trim();
        if message.is_empty() {
            return Ok(false);
        }

        if self.label_sources {
            if line.stream == Stream::Messages {
                write!(self.out, "[{} ({MESSAGES_LABEL})]: ", line.service_name)?;
            } else {
                write!(self.out, "[{}]: ", line.service_name)?;
            }
        }
        writeln!(self.out, "{message}")?;

        self.emitted += 1;
        Ok(true)
    }

    /// Lines written so far (dropped blank lines excluded).
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn line(service: &str, stream: Stream, message: &str) -> LogLine {
        LogLine {
            service_name: service.to_string(),
            stream,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            message: message.to_string(),
        }
    }

    fn render(label_sources: bool, lines: &[LogLine]) -> String {
        let mut presenter = Presenter::new(Vec::new(), label_sources);
        for l in lines {
            presenter.emit(l).unwrap();
        }
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_single_source_prints_bare_trimmed_message() {
        let out = render(false, &[line("api", Stream::Stdout, "  ready \n")]);
        assert_eq!(out, "ready\n");
    }

    #[test]
    fn test_multiple_sources_are_labelled() {
        let out = render(
            true,
            &[
                line("api", Stream::Stdout, "ready"),
                line("db", Stream::Stderr, "slow query"),
                line("api", Stream::Messages, "Service started"),
            ],
        );
        assert_eq!(
            out,
            "[api]: ready\n[db]: slow query\n[api (svctail)]: Service started\n"
        );
    }

    #[test]
    fn test_blank_messages_are_dropped() {
        let mut presenter = Presenter::new(Vec::new(), true);
        assert!(!presenter.emit(&line("api", Stream::Stdout, "   \t\n")).unwrap());
        assert!(!presenter.emit(&line("api", Stream::Stdout, "")).unwrap());
        assert!(presenter.emit(&line("api", Stream::Stdout, "x")).unwrap());
        assert_eq!(presenter.emitted(), 1);
        assert_eq!(String::from_utf8(presenter.into_inner()).unwrap(), "[api]: x\n");
    }

    #[test]
    fn test_banner() {
        let mut presenter = Presenter::new(Vec::new(), false);
        presenter.banner().unwrap();
        assert_eq!(
            String::from_utf8(presenter.into_inner()).unwrap(),
            "=== Logs ===\n"
        );
    }
}
