use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use logparser::{parse, CliOverrides, EncodingMode, ParseSummary, ParserConfig};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File or directory to scan [default: .]
    #[arg(env = "LOGPARSER_INPUT")]
    input: Option<PathBuf>,

    /// Output directory, deleted and recreated on every run [default: ./logparser_results]
    #[arg(short = 'o', long = "output", env = "LOGPARSER_OUTPUT")]
    output: Option<PathBuf>,

    /// File name wildcard, `*` matches anything; repeatable [default: *.log]
    #[arg(short = 'f', long = "file-pattern", env = "LOGPARSER_FILE_PATTERN")]
    file_patterns: Vec<String>,

    /// Regular expression a whole line must match to be selected; repeatable
    /// [default: .*(E|e)xception:.+]
    #[arg(short = 'l', long = "line-pattern", env = "LOGPARSER_LINE_PATTERN")]
    line_patterns: Vec<String>,

    /// Regular expression locating the timestamp in a selected line
    /// [default: \[[\d\.:aApPmM ]+\]\s?]
    #[arg(short = 't', long = "time-pattern", env = "LOGPARSER_TIME_PATTERN")]
    time_pattern: Option<String>,

    /// Regular expression for lines continuing a selected line; repeatable
    /// [default: (\s+at|Caused by:).+]
    #[arg(
        short = 'c',
        long = "continuous-line-pattern",
        env = "LOGPARSER_CONTINUOUS_LINE_PATTERN"
    )]
    continuation_patterns: Vec<String>,

    /// Maximum continuation lines per selected line, negative for no limit [default: 50]
    #[arg(
        short = 'n',
        long = "continuous-line-count",
        env = "LOGPARSER_CONTINUOUS_LINE_COUNT",
        allow_negative_numbers = true
    )]
    continuation_line_count: Option<i64>,

    /// Write the original line number before every selected line [default: off]
    #[arg(
        short = 'p',
        long = "prepend-origin",
        env = "LOGPARSER_PREPEND_ORIGIN",
        overrides_with = "no_prepend_origin"
    )]
    prepend_origin: bool,

    /// Don't write original line numbers, even if a config file asks for them
    #[arg(long = "no-prepend-origin", overrides_with = "prepend_origin")]
    no_prepend_origin: bool,

    /// Collect unique entries across all files instead of copying matches [default: off]
    #[arg(
        short = 'a',
        long = "aggregate",
        env = "LOGPARSER_AGGREGATE",
        overrides_with = "no_aggregate"
    )]
    aggregate: bool,

    /// Write filtered copies, even if a config file selects aggregate mode
    #[arg(long = "no-aggregate", overrides_with = "aggregate")]
    no_aggregate: bool,

    /// How to handle invalid UTF-8 sequences (failfast|lossy) [default: lossy]
    #[arg(long, env = "LOGPARSER_ENCODING")]
    encoding: Option<String>,

    /// Configuration file layered over the global and local ones
    #[arg(long, env = "LOGPARSER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence [default: info]
    #[arg(long, env = "LOGPARSER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Don't print the summary
    #[arg(short, long)]
    quiet: bool,
}

/// `Some(true)` for the flag, `Some(false)` for its negation, `None` for neither
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl Cli {
    /// Options given on the command line; everything else stays unset
    fn overrides(&self) -> Result<CliOverrides> {
        let patterns = |values: &[String]| (!values.is_empty()).then(|| values.to_vec());

        let encoding_mode = self
            .encoding
            .as_deref()
            .map(str::parse::<EncodingMode>)
            .transpose()?;

        Ok(CliOverrides {
            input: self.input.clone(),
            output_dir: self.output.clone(),
            file_patterns: patterns(&self.file_patterns),
            line_patterns: patterns(&self.line_patterns),
            time_pattern: self.time_pattern.clone(),
            continuation_patterns: patterns(&self.continuation_patterns),
            continuation_line_count: self.continuation_line_count,
            prepend_origin: switch(self.prepend_origin, self.no_prepend_origin),
            aggregate: switch(self.aggregate, self.no_aggregate),
            encoding_mode,
            log_level: self.log_level.clone(),
        })
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error occurred while running:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = ParserConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(cli.overrides()?);

    init_logging(&config.log_level);

    let summary = parse(&config)?;
    if !cli.quiet {
        print_summary(&summary, &config);
    }
    Ok(())
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &ParseSummary, config: &ParserConfig) {
    println!(
        "{} {} files scanned, {} matched, {} lines selected",
        "Done:".green().bold(),
        summary.files_scanned,
        summary.files_matched,
        summary.lines_selected
    );
    if config.aggregate {
        println!(
            "Wrote {} unique entries to {}",
            summary.entries_written,
            config.output_dir.display().to_string().blue()
        );
    } else {
        println!(
            "Wrote {} filtered files to {}",
            summary.files_written,
            config.output_dir.display().to_string().blue()
        );
    }
    if summary.entries_skipped > 0 {
        println!(
            "{} {} unreadable directory entries skipped",
            "Warning:".yellow().bold(),
            summary.entries_skipped
        );
    }
}
