//! The scanning engine.
//!
//! A run is assembled from four parts:
//!
//! 1. [`matcher`] compiles the filename, line, continuation and timestamp
//!    patterns once per run
//! 2. [`scanner`] classifies the lines of one file with a small state machine
//! 3. [`processor`] drives the scanner over a file and builds aggregation entries
//! 4. [`engine`] walks the input, dispatches every file to the selected output
//!    strategy and returns a [`crate::results::ParseSummary`]
//!
//! Everything runs on the calling thread: a file is scanned and its output
//! written (or its entries recorded) before the next file is visited.
//!
//! ```rust,ignore
//! let config = ParserConfig::new("./logs", "./logparser_results");
//! let summary = logparser::search::parse(&config)?;
//! println!("{} files matched", summary.files_matched);
//! ```
pub mod engine;
pub mod matcher;
pub mod processor;
pub mod scanner;

pub use engine::{parse, parse_with_observer};
pub use matcher::{CompiledPatterns, PatternMatcher};
pub use processor::FileProcessor;
pub use scanner::{LineKind, LineScanner, ScanState, ScannedLine, ScannedLines};
