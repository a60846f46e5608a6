use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, trace};

use super::matcher::CompiledPatterns;
use super::scanner::{LineScanner, ScannedLine, ScannedLines};
use crate::config::EncodingMode;
use crate::errors::{ParseError, ParseResult};
use crate::results::{LogAggregation, LogOrigin};

const BUFFER_CAPACITY: usize = 65536;

/// Drives the line scanner over single files
#[derive(Debug)]
pub struct FileProcessor {
    patterns: CompiledPatterns,
    continuation_limit: usize,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    /// Creates a processor; `continuation_limit` of `usize::MAX` is unbounded
    pub fn new(
        patterns: CompiledPatterns,
        continuation_limit: usize,
        encoding_mode: EncodingMode,
    ) -> Self {
        Self {
            patterns,
            continuation_limit,
            encoding_mode,
        }
    }

    pub fn patterns(&self) -> &CompiledPatterns {
        &self.patterns
    }

    /// Opens a file and returns the lazy sequence of its selected lines
    pub fn scan(&self, path: &Path) -> ParseResult<ScannedLines<'_, BufReader<File>>> {
        trace!("Scanning file: {}", path.display());
        let file = File::open(path).map_err(|e| ParseError::io(path, e))?;
        let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let scanner = LineScanner::new(
            &self.patterns.lines,
            &self.patterns.continuations,
            self.continuation_limit,
        );
        Ok(ScannedLines::new(reader, scanner, path, self.encoding_mode))
    }

    /// Records every entry of a file in the aggregation.
    ///
    /// Returns the number of selected lines.
    pub fn aggregate_file(&self, path: &Path, aggregation: &mut LogAggregation) -> ParseResult<usize> {
        let lines = self.scan(path)?;
        let selected = collect_entries(&self.patterns, path, lines, aggregation)?;
        debug!("Selected {} lines in {}", selected, path.display());
        Ok(selected)
    }
}

/// Builds entries from scanner output and records them.
///
/// A line of interest closes the previous entry and opens a new one whose
/// origin is that line; continuation lines are appended verbatim. The last
/// open entry is recorded at end of input.
pub fn collect_entries<I>(
    patterns: &CompiledPatterns,
    file: &Path,
    lines: I,
    aggregation: &mut LogAggregation,
) -> ParseResult<usize>
where
    I: IntoIterator<Item = ParseResult<ScannedLine>>,
{
    let mut builder = EntryBuilder::default();
    let mut selected = 0;

    for line in lines {
        let line = line?;
        selected += 1;
        if line.is_continuation() {
            builder.push_continuation(&line.text);
        } else {
            builder.finish_into(aggregation);
            let (timestamp, text) = patterns.split_timestamp(&line.text);
            builder.start(text, LogOrigin::new(line.line_number, timestamp, file));
        }
    }
    builder.finish_into(aggregation);

    Ok(selected)
}

/// Accumulates the text of the entry being built
#[derive(Debug, Default)]
struct EntryBuilder {
    text: String,
    origin: Option<LogOrigin>,
}

impl EntryBuilder {
    fn start(&mut self, first_line: String, origin: LogOrigin) {
        self.text = first_line;
        self.origin = Some(origin);
    }

    fn push_continuation(&mut self, line: &str) {
        // Continuations only follow a line of interest
        if self.origin.is_some() {
            self.text.push('\n');
            self.text.push_str(line);
        }
    }

    fn finish_into(&mut self, aggregation: &mut LogAggregation) {
        if let Some(origin) = self.origin.take() {
            aggregation.record(std::mem::take(&mut self.text), origin);
        }
    }
}
