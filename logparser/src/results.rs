//! Result types for parser runs.
//!
//! The central type is [`LogAggregation`], the deduplicating store used in
//! aggregate mode. Its only mutation is [`LogAggregation::record`]: an entry
//! text is inserted once and every later occurrence is appended to its origin
//! list, so the list always reflects recording order.
//!
//! ```rust,ignore
//! let mut aggregation = LogAggregation::new();
//! aggregation.record("Exception: boom".to_string(), origin_a);
//! aggregation.record("Exception: boom".to_string(), origin_b);
//! assert_eq!(aggregation.len(), 1);
//! assert_eq!(aggregation.origins("Exception: boom").unwrap().len(), 2);
//! ```
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::ParseResult;

/// Text of one matched block: the line of interest without its timestamp,
/// followed by its continuation lines, newline-joined
pub type LogEntry = String;

/// Where one occurrence of an entry starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOrigin {
    /// 1-based line number of the line of interest
    pub line_number: u64,
    /// Timestamp found in the line of interest, empty if there was none
    pub timestamp: String,
    /// File the entry was found in
    pub file: PathBuf,
}

impl LogOrigin {
    pub fn new(line_number: u64, timestamp: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            line_number,
            timestamp: timestamp.into(),
            file: file.into(),
        }
    }
}

/// Unique entries mapped to every place they occurred, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct LogAggregation {
    index: HashMap<LogEntry, usize>,
    entries: Vec<(LogEntry, Vec<LogOrigin>)>,
}

impl LogAggregation {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends an origin to the entry, creating the entry if it is new
    pub fn record(&mut self, entry: LogEntry, origin: LogOrigin) {
        match self.index.get(&entry) {
            Some(&slot) => self.entries[slot].1.push(origin),
            None => {
                self.index.insert(entry.clone(), self.entries.len());
                self.entries.push((entry, vec![origin]));
            }
        }
    }

    /// Number of unique entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of recorded occurrences
    pub fn occurrences(&self) -> usize {
        self.entries.iter().map(|(_, origins)| origins.len()).sum()
    }

    /// Origins of an entry, in recording order
    pub fn origins(&self, entry: &str) -> Option<&[LogOrigin]> {
        self.index
            .get(entry)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// Entries with their origins, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LogOrigin])> {
        self.entries
            .iter()
            .map(|(entry, origins)| (entry.as_str(), origins.as_slice()))
    }

    /// Writes one file per entry into `output_dir`, consuming the store
    pub fn flush(self, output_dir: &Path) -> ParseResult<usize> {
        crate::output::write_aggregation(&self, output_dir)
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Files that passed the filename filter and were scanned
    pub files_scanned: usize,
    /// Files that produced at least one selected line
    pub files_matched: usize,
    /// Lines of interest and continuation lines selected across all files
    pub lines_selected: usize,
    /// Output files written
    pub files_written: usize,
    /// Unique entries (aggregate mode only)
    pub entries_written: usize,
    /// Directory entries the walker could not read
    pub entries_skipped: usize,
}

impl ParseSummary {
    pub fn new() -> Self {
        Default::default()
    }

    /// Accounts for one scanned file that selected `lines` lines
    pub fn add_file(&mut self, lines: usize) {
        self.files_scanned += 1;
        if lines > 0 {
            self.files_matched += 1;
            self.lines_selected += lines;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deduplicates_in_order() {
        let mut aggregation = LogAggregation::new();
        aggregation.record("Exception: a".to_string(), LogOrigin::new(1, "", "x.log"));
        aggregation.record("Exception: b".to_string(), LogOrigin::new(5, "[1:00]", "x.log"));
        aggregation.record("Exception: a".to_string(), LogOrigin::new(9, "[2:00]", "y.log"));
        aggregation.record("Exception: a".to_string(), LogOrigin::new(3, "", "z.log"));

        assert_eq!(aggregation.len(), 2);
        assert_eq!(aggregation.occurrences(), 4);

        let origins = aggregation.origins("Exception: a").unwrap();
        assert_eq!(origins.len(), 3);
        assert_eq!(origins[0], LogOrigin::new(1, "", "x.log"));
        assert_eq!(origins[1], LogOrigin::new(9, "[2:00]", "y.log"));
        assert_eq!(origins[2], LogOrigin::new(3, "", "z.log"));

        assert_eq!(aggregation.origins("Exception: b").unwrap().len(), 1);
        assert!(aggregation.origins("Exception: c").is_none());
    }

    #[test]
    fn test_iteration_is_first_seen_order() {
        let mut aggregation = LogAggregation::new();
        for name in ["c", "a", "b", "a", "c"] {
            aggregation.record(name.to_string(), LogOrigin::new(1, "", "f.log"));
        }

        let counts: Vec<(&str, usize)> = aggregation
            .iter()
            .map(|(entry, origins)| (entry, origins.len()))
            .collect();
        assert_eq!(counts, vec![("c", 2), ("a", 2), ("b", 1)]);
    }

    #[test]
    fn test_entries_compare_exactly() {
        let mut aggregation = LogAggregation::new();
        aggregation.record("Exception: a".to_string(), LogOrigin::new(1, "", "f.log"));
        aggregation.record("Exception: a ".to_string(), LogOrigin::new(2, "", "f.log"));
        aggregation.record("exception: a".to_string(), LogOrigin::new(3, "", "f.log"));
        assert_eq!(aggregation.len(), 3);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ParseSummary::new();
        summary.add_file(0);
        summary.add_file(3);
        summary.add_file(2);

        assert_eq!(summary.files_scanned, 3);
        assert_eq!(summary.files_matched, 2);
        assert_eq!(summary.lines_selected, 5);
        assert_eq!(summary.files_written, 0);
        assert_eq!(summary.entries_skipped, 0);
    }
}
