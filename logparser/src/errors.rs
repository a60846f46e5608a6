//! Error types for logparser.
//!
//! Every failure a run can hit is fatal: the engine never retries and never
//! rolls back output that was already written. Errors are grouped the same way
//! the run proceeds:
//!
//! 1. **Configuration** - an unparseable pattern or an invalid option value,
//!    reported before any file is touched
//! 2. **Input** - the input path does not exist
//! 3. **Output** - the output directory or a mirrored file could not be created
//! 4. **Reading** - a source file failed to read or decode mid-scan
//!
//! ```rust,ignore
//! match logparser::parse(&config) {
//!     Ok(summary) => // Report summary,
//!     Err(ParseError::InputNotFound(path)) => // Nothing to scan,
//!     Err(e) => // Everything else aborts the run
//! }
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while scanning logs
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Input file or directory doesn't exist: {0}")]
    InputNotFound(PathBuf),
    #[error("Couldn't create output {path}: {source}")]
    OutputCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid UTF-8 in file {path} at line {line}: {source}")]
    EncodingError {
        path: PathBuf,
        line: u64,
        source: std::string::FromUtf8Error,
    },
}

impl ParseError {
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound(path.into())
    }

    pub fn output_creation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputCreation {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn encoding_error(
        path: impl Into<PathBuf>,
        line: u64,
        source: std::string::FromUtf8Error,
    ) -> Self {
        Self::EncodingError {
            path: path.into(),
            line,
            source,
        }
    }

    /// True for errors raised before any file was read or written
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. } | Self::ConfigError(_))
    }
}
