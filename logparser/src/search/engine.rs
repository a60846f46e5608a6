use std::path::Path;
use tracing::{debug, info, warn};

use super::matcher::CompiledPatterns;
use super::processor::FileProcessor;
use crate::config::ParserConfig;
use crate::errors::{ParseError, ParseResult};
use crate::filters::{relative_to_root, unify_path, walk_files};
use crate::observer::{FileObserver, LoggingObserver};
use crate::output::{prepare_output_dir, write_filtered_file};
use crate::results::{LogAggregation, ParseSummary};

/// Runs the parser, logging every matched file
pub fn parse(config: &ParserConfig) -> ParseResult<ParseSummary> {
    parse_with_observer(config, &mut LoggingObserver)
}

/// Runs the parser, reporting every matched file to `observer`.
///
/// Patterns are compiled and the input is checked before the output
/// directory is touched. Output written before a failure stays in place.
pub fn parse_with_observer(
    config: &ParserConfig,
    observer: &mut dyn FileObserver,
) -> ParseResult<ParseSummary> {
    info!(
        "Starting parse of {} into {} ({} mode)",
        config.input.display(),
        config.output_dir.display(),
        if config.aggregate { "aggregate" } else { "filter" }
    );

    config.validate()?;
    let patterns = CompiledPatterns::compile(config)?;

    if !config.input.exists() {
        return Err(ParseError::input_not_found(&config.input));
    }
    check_output_location(&config.input, &config.output_dir)?;
    prepare_output_dir(&config.output_dir)?;

    let processor = FileProcessor::new(
        patterns,
        config.continuation_limit(),
        config.encoding_mode,
    );

    let summary = if config.aggregate {
        aggregate_files(config, &processor, observer)?
    } else {
        filter_files(config, &processor, observer)?
    };

    info!(
        "Parse complete. Selected {} lines in {} of {} files",
        summary.lines_selected, summary.files_matched, summary.files_scanned
    );
    if summary.entries_skipped > 0 {
        warn!(
            "{} unreadable directory entries were skipped",
            summary.entries_skipped
        );
    }
    Ok(summary)
}

/// Refuses output directories that would swallow the input when recreated
fn check_output_location(input: &Path, output_dir: &Path) -> ParseResult<()> {
    if output_dir.exists() && unify_path(input).starts_with(unify_path(output_dir)) {
        return Err(ParseError::config_error(format!(
            "Output directory {} contains the input {}",
            output_dir.display(),
            input.display()
        )));
    }
    Ok(())
}

/// Filtered-copy mode: mirror each matching file's selected lines
fn filter_files(
    config: &ParserConfig,
    processor: &FileProcessor,
    observer: &mut dyn FileObserver,
) -> ParseResult<ParseSummary> {
    let mut summary = ParseSummary::new();

    let skipped = walk_files(
        &config.input,
        &processor.patterns().filenames,
        Some(&config.output_dir),
        |path| {
            let relative = relative_to_root(&config.input, path);
            let output_path = config.output_dir.join(&relative);
            let lines = processor.scan(path)?;
            let written = write_filtered_file(lines, &output_path, config.prepend_origin, || {
                observer.file_matched(&relative)
            })?;
            debug!("{}: {} lines selected", relative.display(), written);

            summary.add_file(written);
            if written > 0 {
                summary.files_written += 1;
            }
            Ok(())
        },
    )?;

    summary.entries_skipped = skipped;
    Ok(summary)
}

/// Aggregate mode: collect entries from all files, then dump them
fn aggregate_files(
    config: &ParserConfig,
    processor: &FileProcessor,
    observer: &mut dyn FileObserver,
) -> ParseResult<ParseSummary> {
    let mut summary = ParseSummary::new();
    let mut aggregation = LogAggregation::new();

    let skipped = walk_files(
        &config.input,
        &processor.patterns().filenames,
        Some(&config.output_dir),
        |path| {
            let selected = processor.aggregate_file(path, &mut aggregation)?;
            if selected > 0 {
                observer.file_matched(&relative_to_root(&config.input, path));
            }
            summary.add_file(selected);
            Ok(())
        },
    )?;

    summary.entries_skipped = skipped;
    debug!(
        "Aggregated {} occurrences into {} unique entries",
        aggregation.occurrences(),
        aggregation.len()
    );
    summary.entries_written = aggregation.len();
    summary.files_written = aggregation.flush(&config.output_dir)?;
    Ok(summary)
}
