use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ParseError, ParseResult};

/// Default value for [`ParserConfig::output_dir`]
pub const DEFAULT_OUTPUT_DIR: &str = "./logparser_results";
/// Default value for [`ParserConfig::file_patterns`]
pub const DEFAULT_FILE_PATTERN: &str = "*.log";
/// Default value for [`ParserConfig::line_patterns`]
pub const DEFAULT_LINE_PATTERN: &str = r".*(E|e)xception:.+";
/// Default value for [`ParserConfig::time_pattern`]
pub const DEFAULT_TIME_PATTERN: &str = r"\[[\d\.:aApPmM ]+\]\s?";
/// Default value for [`ParserConfig::continuation_patterns`]
pub const DEFAULT_CONTINUATION_PATTERN: &str = r"(\s+at|Caused by:).+";
/// Default value for [`ParserConfig::continuation_line_count`]
pub const DEFAULT_CONTINUATION_LINE_COUNT: i64 = 50;

/// How to handle bytes in a source file that are not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Abort the run on the first invalid line
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep going
    #[default]
    Lossy,
}

impl std::str::FromStr for EncodingMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "failfast" => Ok(EncodingMode::FailFast),
            "lossy" => Ok(EncodingMode::Lossy),
            other => Err(ParseError::config_error(format!(
                "Unknown encoding mode '{}' (expected failfast or lossy)",
                other
            ))),
        }
    }
}

/// Options for one parser run.
///
/// # Configuration Locations
///
/// Values are layered from these files, later ones taking precedence:
/// 1. Global `$HOME/.config/logparser/config.yaml`
/// 2. Local `.logparser.yaml` in the current directory
/// 3. Custom config file specified via `--config`
///
/// Command line arguments are applied last through [`ParserConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// input: "./logs"
/// output_dir: "./logparser_results"
/// file_patterns: ["*.log", "*.txt"]
/// line_patterns: ['.*(E|e)xception:.+']
/// time_pattern: '\[[\d\.:aApPmM ]+\]\s?'
/// continuation_patterns: ['(\s+at|Caused by:).+']
/// # Negative values mean "no limit"
/// continuation_line_count: 50
/// prepend_origin: false
/// aggregate: true
/// encoding_mode: lossy
/// log_level: info
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// File or directory to traverse
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory receiving the results; recreated on every run
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Wildcard patterns for file names (`*` matches any run of characters).
    /// An empty list accepts every file.
    #[serde(default = "default_file_patterns")]
    pub file_patterns: Vec<String>,

    /// Regular expressions a whole line must match to be of interest
    #[serde(default = "default_line_patterns")]
    pub line_patterns: Vec<String>,

    /// Regular expression locating the timestamp inside a line of interest
    #[serde(default = "default_time_pattern")]
    pub time_pattern: String,

    /// Regular expressions a whole line must match to continue an entry
    #[serde(default = "default_continuation_patterns")]
    pub continuation_patterns: Vec<String>,

    /// Maximum continuation lines captured per line of interest
    #[serde(default = "default_continuation_line_count")]
    pub continuation_line_count: i64,

    /// Write `### Original line: <n> ###` before each line of interest
    #[serde(default)]
    pub prepend_origin: bool,

    /// Deduplicate entries across files instead of writing filtered copies
    #[serde(default)]
    pub aggregate: bool,

    /// Handling of invalid UTF-8 in source files
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Options given explicitly on the command line.
///
/// `None` means "not given" and keeps the value from the configuration files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub file_patterns: Option<Vec<String>>,
    pub line_patterns: Option<Vec<String>>,
    pub time_pattern: Option<String>,
    pub continuation_patterns: Option<Vec<String>>,
    pub continuation_line_count: Option<i64>,
    pub prepend_origin: Option<bool>,
    pub aggregate: Option<bool>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

fn default_input() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_file_patterns() -> Vec<String> {
    vec![DEFAULT_FILE_PATTERN.to_string()]
}

fn default_line_patterns() -> Vec<String> {
    vec![DEFAULT_LINE_PATTERN.to_string()]
}

fn default_time_pattern() -> String {
    DEFAULT_TIME_PATTERN.to_string()
}

fn default_continuation_patterns() -> Vec<String> {
    vec![DEFAULT_CONTINUATION_PATTERN.to_string()]
}

fn default_continuation_line_count() -> i64 {
    DEFAULT_CONTINUATION_LINE_COUNT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            file_patterns: default_file_patterns(),
            line_patterns: default_line_patterns(),
            time_pattern: default_time_pattern(),
            continuation_patterns: default_continuation_patterns(),
            continuation_line_count: default_continuation_line_count(),
            prepend_origin: false,
            aggregate: false,
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl ParserConfig {
    /// Creates a default configuration for the given input and output paths
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("logparser/config.yaml")),
            // Local config
            Some(PathBuf::from(".logparser.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file has to exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Applies the values given explicitly on the command line.
    ///
    /// Every `Some` replaces the file value, even when it equals the default.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(input) = cli.input {
            self.input = input;
        }
        if let Some(output_dir) = cli.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(file_patterns) = cli.file_patterns {
            self.file_patterns = file_patterns;
        }
        if let Some(line_patterns) = cli.line_patterns {
            self.line_patterns = line_patterns;
        }
        if let Some(time_pattern) = cli.time_pattern {
            self.time_pattern = time_pattern;
        }
        if let Some(continuation_patterns) = cli.continuation_patterns {
            self.continuation_patterns = continuation_patterns;
        }
        if let Some(count) = cli.continuation_line_count {
            self.continuation_line_count = count;
        }
        if let Some(prepend_origin) = cli.prepend_origin {
            self.prepend_origin = prepend_origin;
        }
        if let Some(aggregate) = cli.aggregate {
            self.aggregate = aggregate;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Checks option values that the type system cannot
    pub fn validate(&self) -> ParseResult<()> {
        if self.line_patterns.is_empty() {
            return Err(ParseError::config_error(
                "At least one line pattern is required",
            ));
        }
        Ok(())
    }

    /// Continuation limit as seen by the line scanner; negative counts mean unbounded
    pub fn continuation_limit(&self) -> usize {
        continuation_limit(self.continuation_line_count)
    }
}

/// Translates a configured continuation count into a scanner limit.
///
/// Negative values map to `usize::MAX`, which the scanner can never reach.
pub fn continuation_limit(configured: i64) -> usize {
    usize::try_from(configured).unwrap_or(usize::MAX)
}
