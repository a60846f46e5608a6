pub mod config;
pub mod errors;
pub mod filters;
pub mod observer;
pub mod output;
pub mod results;
pub mod search;

pub use config::{CliOverrides, EncodingMode, ParserConfig};
pub use errors::{ParseError, ParseResult};
pub use observer::{FileObserver, LoggingObserver};
pub use results::{LogAggregation, LogEntry, LogOrigin, ParseSummary};
pub use search::{parse, parse_with_observer};
