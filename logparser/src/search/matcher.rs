use regex::Regex;
use tracing::debug;

use crate::config::ParserConfig;
use crate::errors::{ParseError, ParseResult};

/// Converts a wildcard pattern into an anchored regular expression source.
///
/// `*` matches any run of characters; everything else is literal.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    anchored(&body)
}

/// Wraps a regex source so it has to match the whole input
fn anchored(source: &str) -> String {
    format!(r"(?s)\A(?:{})\z", source)
}

/// Compiles a wildcard filename pattern, matched against bare file names
pub fn compile_filename_pattern(pattern: &str) -> ParseResult<Regex> {
    Regex::new(&wildcard_to_regex(pattern))
        .map_err(|e| ParseError::invalid_pattern(pattern, e))
}

/// Compiles a line pattern; matching is whole-line
pub fn compile_line_pattern(pattern: &str) -> ParseResult<Regex> {
    // Validate the raw pattern first so a stray `)` is not absorbed by the wrapper
    Regex::new(pattern).map_err(|e| ParseError::invalid_pattern(pattern, e))?;
    Regex::new(&anchored(pattern)).map_err(|e| ParseError::invalid_pattern(pattern, e))
}

/// Compiles a continuation pattern; same whole-line semantics as line patterns
pub fn compile_continuation_pattern(pattern: &str) -> ParseResult<Regex> {
    compile_line_pattern(pattern)
}

/// Compiles a timestamp pattern, used to find (not anchor) a substring in a line
pub fn compile_time_pattern(pattern: &str) -> ParseResult<Regex> {
    Regex::new(pattern).map_err(|e| ParseError::invalid_pattern(pattern, e))
}

/// A set of whole-input patterns combined with logical OR
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<Regex>,
}

impl PatternMatcher {
    /// Builds a matcher over wildcard filename patterns
    pub fn filenames<S: AsRef<str>>(patterns: &[S]) -> ParseResult<Self> {
        Self::compile(patterns, compile_filename_pattern)
    }

    /// Builds a matcher over line-of-interest patterns
    pub fn lines<S: AsRef<str>>(patterns: &[S]) -> ParseResult<Self> {
        Self::compile(patterns, compile_line_pattern)
    }

    /// Builds a matcher over continuation patterns
    pub fn continuations<S: AsRef<str>>(patterns: &[S]) -> ParseResult<Self> {
        Self::compile(patterns, compile_continuation_pattern)
    }

    fn compile<S, F>(patterns: &[S], compile: F) -> ParseResult<Self>
    where
        S: AsRef<str>,
        F: Fn(&str) -> ParseResult<Regex>,
    {
        let patterns = patterns
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<ParseResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// True if no pattern was supplied
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if at least one pattern matches the whole text
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|regex| regex.is_match(text))
    }
}

/// All patterns of a run, compiled once and shared read-only across files
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    pub filenames: PatternMatcher,
    pub lines: PatternMatcher,
    pub continuations: PatternMatcher,
    pub time: Regex,
}

impl CompiledPatterns {
    /// Compiles every pattern named by the configuration
    pub fn compile(config: &ParserConfig) -> ParseResult<Self> {
        debug!(
            "Compiling patterns: files={:?} lines={:?} time={:?} continuations={:?}",
            config.file_patterns,
            config.line_patterns,
            config.time_pattern,
            config.continuation_patterns
        );
        Ok(Self {
            filenames: PatternMatcher::filenames(&config.file_patterns)?,
            lines: PatternMatcher::lines(&config.line_patterns)?,
            continuations: PatternMatcher::continuations(&config.continuation_patterns)?,
            time: compile_time_pattern(&config.time_pattern)?,
        })
    }

    /// Splits the first timestamp off a line of interest.
    ///
    /// Returns the trimmed timestamp (empty if none was found) and the line with
    /// that first occurrence removed.
    pub fn split_timestamp(&self, line: &str) -> (String, String) {
        match self.time.find(line) {
            Some(m) => {
                let mut stripped = String::with_capacity(line.len() - m.len());
                stripped.push_str(&line[..m.start()]);
                stripped.push_str(&line[m.end()..]);
                (m.as_str().trim().to_string(), stripped)
            }
            None => (String::new(), line.to_string()),
        }
    }
}
