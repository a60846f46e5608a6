//! Per-file line classification.
//!
//! A [`LineScanner`] walks the lines of one file and decides for each line
//! whether it starts an entry (a line of interest), continues the current
//! entry, or is irrelevant. The decision only depends on the current
//! [`ScanState`] and the line itself:
//!
//! | state             | line                          | emits        | next state             |
//! |-------------------|-------------------------------|--------------|------------------------|
//! | `AfterMatch(n)`   | continuation, `n < limit`     | continuation | `AfterMatch(n + 1)`    |
//! | `AfterMatch(n)`   | continuation, `n == limit`    | nothing      | `AfterMatch(n)`        |
//! | any               | line of interest              | interest     | `AfterMatch(0)`        |
//! | any               | anything else                 | nothing      | `Idle`                 |
//!
//! Lines end at `\n`, `\r\n` or a lone `\r`.
//!
//! Rows are tried top to bottom. Once the counter reaches the limit, further
//! continuation lines are dropped and the state stays at `AfterMatch(limit)`
//! until a line that is not a continuation arrives.
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{trace, warn};

use super::matcher::PatternMatcher;
use crate::config::EncodingMode;
use crate::errors::{ParseError, ParseResult};

/// Continuation state of the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No line of interest is active
    #[default]
    Idle,
    /// A line of interest was seen; holds the continuation lines emitted since
    AfterMatch(usize),
}

/// Classification of an emitted line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Starts a new entry
    Interest,
    /// Belongs to the entry started by the last line of interest
    Continuation,
}

/// One line selected by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    /// Line text without its terminator
    pub text: String,
    /// 1-based line number in the source file
    pub line_number: u64,
    pub kind: LineKind,
}

impl ScannedLine {
    pub fn is_continuation(&self) -> bool {
        self.kind == LineKind::Continuation
    }
}

/// The line classification state machine
#[derive(Debug, Clone)]
pub struct LineScanner<'p> {
    lines: &'p PatternMatcher,
    continuations: &'p PatternMatcher,
    limit: usize,
    state: ScanState,
}

impl<'p> LineScanner<'p> {
    /// Creates a scanner in the `Idle` state.
    ///
    /// `limit` caps the continuation lines per line of interest; `usize::MAX`
    /// means unbounded.
    pub fn new(lines: &'p PatternMatcher, continuations: &'p PatternMatcher, limit: usize) -> Self {
        Self {
            lines,
            continuations,
            limit,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Classifies one line and advances the state.
    ///
    /// Returns `None` for lines that are not emitted.
    pub fn classify(&mut self, line: &str) -> Option<LineKind> {
        let (kind, next) = match self.state {
            ScanState::AfterMatch(count) if self.continuations.is_match(line) => {
                if count < self.limit {
                    (Some(LineKind::Continuation), ScanState::AfterMatch(count + 1))
                } else {
                    // Limit reached: drop the line, keep the run frozen
                    (None, ScanState::AfterMatch(count))
                }
            }
            _ if self.lines.is_match(line) => (Some(LineKind::Interest), ScanState::AfterMatch(0)),
            _ => (None, ScanState::Idle),
        };
        trace!("{:?} -> {:?} ({:?})", self.state, next, kind);
        self.state = next;
        kind
    }
}

/// Lazily scans a reader, yielding only the lines the scanner emits
pub struct ScannedLines<'p, R> {
    reader: R,
    scanner: LineScanner<'p>,
    path: PathBuf,
    encoding_mode: EncodingMode,
    line_number: u64,
    buffer: Vec<u8>,
    replaced_invalid: bool,
    /// The previous line ended in `\r`; a directly following `\n` belongs to it
    skip_line_feed: bool,
}

impl<'p, R: BufRead> ScannedLines<'p, R> {
    pub fn new(
        reader: R,
        scanner: LineScanner<'p>,
        path: impl Into<PathBuf>,
        encoding_mode: EncodingMode,
    ) -> Self {
        Self {
            reader,
            scanner,
            path: path.into(),
            encoding_mode,
            line_number: 0,
            buffer: Vec::with_capacity(256),
            replaced_invalid: false,
            skip_line_feed: false,
        }
    }

    /// Reads the next raw line; `None` at end of input
    fn read_line(&mut self) -> ParseResult<Option<String>> {
        let found = self
            .fill_line()
            .map_err(|e| ParseError::io(&self.path, e))?;
        if !found {
            return Ok(None);
        }
        self.line_number += 1;
        self.decode().map(Some)
    }

    /// Moves the next line into `buffer` without its terminator.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line. Returns false at end of input.
    fn fill_line(&mut self) -> std::io::Result<bool> {
        self.buffer.clear();
        let mut partial = false;
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(partial);
            }
            if self.skip_line_feed {
                self.skip_line_feed = false;
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    continue;
                }
            }
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    self.skip_line_feed = available[end] == b'\r';
                    self.buffer.extend_from_slice(&available[..end]);
                    self.reader.consume(end + 1);
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    self.buffer.extend_from_slice(available);
                    self.reader.consume(len);
                    partial = true;
                }
            }
        }
    }

    fn decode(&mut self) -> ParseResult<String> {
        match self.encoding_mode {
            EncodingMode::FailFast => String::from_utf8(std::mem::take(&mut self.buffer))
                .map_err(|e| ParseError::encoding_error(&self.path, self.line_number, e)),
            EncodingMode::Lossy => {
                let decoded = String::from_utf8_lossy(&self.buffer);
                if let std::borrow::Cow::Owned(_) = decoded {
                    if !self.replaced_invalid {
                        warn!(
                            "Invalid UTF-8 replaced in file: {} (first at line {})",
                            self.path.display(),
                            self.line_number
                        );
                        self.replaced_invalid = true;
                    }
                }
                Ok(decoded.into_owned())
            }
        }
    }
}

impl<R: BufRead> Iterator for ScannedLines<'_, R> {
    type Item = ParseResult<ScannedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.read_line() {
                Ok(Some(text)) => text,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };
            if let Some(kind) = self.scanner.classify(&text) {
                return Some(Ok(ScannedLine {
                    text,
                    line_number: self.line_number,
                    kind,
                }));
            }
        }
    }
}
