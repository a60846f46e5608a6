//! Writing results to the output directory.
//!
//! Two strategies exist and a run uses exactly one of them:
//!
//! - **Filtered copy**: every source file with at least one selected line is
//!   mirrored under the output directory at its path relative to the input
//!   root. Only selected lines are written; lines of interest may be preceded
//!   by a `### Original line: <n> ###` marker.
//! - **Aggregated dump**: every unique entry becomes `entry<N>.log`:
//!
//! ```text
//! ### Text ###
//! Exception: boom
//!   at Foo
//! ### Origins (2) ###
//! Time: [10:00] - File: /var/log/a.log - Line: 1
//! Time: [11:30] - File: /var/log/b.log - Line: 17
//! ```
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, trace};

use crate::errors::{ParseError, ParseResult};
use crate::filters::unify_path;
use crate::results::LogAggregation;
use crate::search::scanner::ScannedLine;

/// Removes whatever is at `output_dir` and creates it again, empty
pub fn prepare_output_dir(output_dir: &Path) -> ParseResult<()> {
    if output_dir.is_dir() {
        debug!("Removing previous output directory {}", output_dir.display());
        fs::remove_dir_all(output_dir).map_err(|e| ParseError::output_creation(output_dir, e))?;
    } else if output_dir.exists() {
        fs::remove_file(output_dir).map_err(|e| ParseError::output_creation(output_dir, e))?;
    }
    fs::create_dir_all(output_dir).map_err(|e| ParseError::output_creation(output_dir, e))
}

/// Creates a new file and its missing parent directories
fn create_new_file(path: &Path) -> ParseResult<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ParseError::output_creation(parent, e))?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ParseError::output_creation(path, e))?;
    Ok(BufWriter::new(file))
}

/// Writes the selected lines of one source file to `output_path`.
///
/// The output file is only created once the first line arrives, so a source
/// without matches leaves no trace. `on_first_line` runs right before that
/// creation. Returns the number of lines written, markers excluded.
pub fn write_filtered_file<I, F>(
    lines: I,
    output_path: &Path,
    prepend_origin: bool,
    on_first_line: F,
) -> ParseResult<usize>
where
    I: IntoIterator<Item = ParseResult<ScannedLine>>,
    F: FnOnce(),
{
    let mut on_first_line = Some(on_first_line);
    let mut writer: Option<BufWriter<File>> = None;
    let mut written = 0;

    for line in lines {
        let line = line?;
        let out = match writer {
            Some(ref mut out) => out,
            None => {
                if let Some(notify) = on_first_line.take() {
                    notify();
                }
                writer.insert(create_new_file(output_path)?)
            }
        };

        let result = if line.is_continuation() || !prepend_origin {
            writeln!(out, "{}", line.text)
        } else {
            writeln!(out, "### Original line: {} ###", line.line_number)
                .and_then(|_| writeln!(out, "{}", line.text))
        };
        result.map_err(|e| ParseError::output_creation(output_path, e))?;
        written += 1;
    }

    if let Some(mut out) = writer {
        out.flush()
            .map_err(|e| ParseError::output_creation(output_path, e))?;
        trace!("Wrote {} lines to {}", written, output_path.display());
    }
    Ok(written)
}

/// Writes one `entry<N>.log` file per unique entry, numbered from 0 in
/// aggregation order. Returns the number of files written.
pub fn write_aggregation(aggregation: &LogAggregation, output_dir: &Path) -> ParseResult<usize> {
    let mut written = 0;
    for (index, (entry, origins)) in aggregation.iter().enumerate() {
        let path = output_dir.join(format!("entry{}.log", index));
        let mut out = create_new_file(&path)?;

        let mut write = || -> std::io::Result<()> {
            writeln!(out, "### Text ###")?;
            writeln!(out, "{}", entry)?;
            writeln!(out, "### Origins ({}) ###", origins.len())?;
            for origin in origins {
                writeln!(
                    out,
                    "Time: {} - File: {} - Line: {}",
                    origin.timestamp,
                    unify_path(&origin.file).display(),
                    origin.line_number
                )?;
            }
            out.flush()
        };
        write().map_err(|e| ParseError::output_creation(&path, e))?;
        written += 1;
    }
    debug!("Wrote {} entry files to {}", written, output_dir.display());
    Ok(written)
}
