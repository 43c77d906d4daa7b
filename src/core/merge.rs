// svctail - core/merge.rs
//
// Historical merge: combines the per-source history batches into the single
// oldest-first sequence shown before live output starts.

use crate::core::model::LogLine;

/// Concatenate per-source batches (in scan order) and sort by timestamp.
///
/// The sort is stable, so lines with equal timestamps keep scan order first
/// and within-source order second. Nothing is added, dropped or deduplicated.
pub fn merge_history(batches: Vec<Vec<LogLine>>) -> Vec<LogLine> {
    let total = batches.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for batch in batches {
        merged.extend(batch);
    }
    merged.sort_by_key(|line| line.timestamp);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Stream;
    use chrono::{TimeZone, Utc};

    fn line(service: &str, secs: u32, message: &str) -> LogLine {
        LogLine {
            service_name: service.to_string(),
            stream: Stream::Stdout,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, secs).unwrap(),
            message: message.to_string(),
        }
    }

    fn labels(lines: &[LogLine]) -> Vec<&str> {
        lines.iter().map(|l| l.message.as_str()).collect()
    }

    #[test]
    fn test_two_sources_interleave_by_timestamp() {
        let a = vec![line("A", 1, "A0"), line("A", 2, "A1"), line("A", 3, "A2")];
        let b = vec![line("B", 0, "B0"), line("B", 4, "B1")];

        let merged = merge_history(vec![a, b]);

        assert_eq!(labels(&merged), ["B0", "A0", "A1", "A2", "B1"]);
    }

    #[test]
    fn test_equal_timestamps_keep_scan_then_source_order() {
        let first = vec![line("A", 5, "A0"), line("A", 5, "A1")];
        let second = vec![line("B", 5, "B0"), line("B", 1, "B1")];

        let merged = merge_history(vec![first, second]);

        assert_eq!(labels(&merged), ["B1", "A0", "A1", "B0"]);
    }

    #[test]
    fn test_merge_is_a_sorted_permutation() {
        let batches = vec![
            vec![line("A", 9, "a9"), line("A", 3, "a3"), line("A", 3, "a3")],
            vec![],
            vec![line("C", 7, "c7"), line("C", 0, "c0")],
        ];
        let mut expected: Vec<LogLine> = batches.iter().flatten().cloned().collect();

        let merged = merge_history(batches);

        assert!(merged.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        let mut actual = merged.clone();
        let key = |l: &LogLine| (l.timestamp, l.service_name.clone(), l.message.clone());
        actual.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        assert!(merge_history(Vec::new()).is_empty());
        assert!(merge_history(vec![Vec::new(), Vec::new()]).is_empty());
    }
}
