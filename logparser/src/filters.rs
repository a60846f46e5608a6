//! File selection for a parser run.
//!
//! The walker visits every regular file under the input root, top-down and in
//! file-name order within each directory, and hands a file to the visitor
//! only when its bare name matches at least one filename pattern. An empty
//! pattern set accepts every file. Nothing else is filtered: hidden files,
//! `.gitignore` rules and the like are all ignored, because log directories are
//! not source trees.
//!
//! ```rust,ignore
//! walk_files(Path::new("logs"), &patterns.filenames, None, |path| {
//!     process(path)
//! })?;
//! ```
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::errors::ParseResult;
use crate::search::matcher::PatternMatcher;

/// Checks a file's bare name against the filename patterns
pub fn matches_file_name(path: &Path, filenames: &PatternMatcher) -> bool {
    if filenames.is_empty() {
        return true;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| filenames.is_match(name))
}

/// Visits every matching regular file below `root`.
///
/// `skip_dir` prunes one directory from the traversal; the engine uses it to
/// keep the output directory out of the scan. The first error returned by
/// `visit` stops the walk. Entries the walker itself cannot read are logged and
/// skipped; their number is returned.
pub fn walk_files<F>(
    root: &Path,
    filenames: &PatternMatcher,
    skip_dir: Option<&Path>,
    mut visit: F,
) -> ParseResult<usize>
where
    F: FnMut(&Path) -> ParseResult<()>,
{
    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    if let Some(skip) = skip_dir.map(unify_path) {
        debug!("Excluding {} from traversal", skip.display());
        walker.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && unify_path(entry.path()) == skip)
        });
    }

    let mut skipped = 0;
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if matches_file_name(path, filenames) {
            trace!("Visiting {}", path.display());
            visit(path)?;
        } else {
            trace!("Skipping {} (name does not match)", path.display());
        }
    }
    Ok(skipped)
}

/// Path of `file` relative to the input root.
///
/// A file that is the root itself maps to its bare name.
pub fn relative_to_root(root: &Path, file: &Path) -> PathBuf {
    match file.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| file.to_path_buf()),
    }
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn collect(root: &Path, patterns: &[&str], skip: Option<&Path>) -> Vec<PathBuf> {
        let filenames = PatternMatcher::filenames(patterns).unwrap();
        let mut visited = Vec::new();
        let skipped = walk_files(root, &filenames, skip, |path| {
            visited.push(relative_to_root(root, path));
            Ok(())
        })
        .unwrap();
        assert_eq!(skipped, 0);
        visited
    }

    fn create_tree(root: &Path) {
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("app.log"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("nested/server.log"), "").unwrap();
        fs::write(root.join("nested/deeper/trace.log"), "").unwrap();
        fs::write(root.join(".hidden/secret.log"), "").unwrap();
        fs::write(root.join(".gitignore"), "*.log\n").unwrap();
    }

    #[test]
    fn test_matches_file_name() {
        let filenames = PatternMatcher::filenames(&["*.log"]).unwrap();
        assert!(matches_file_name(Path::new("dir/app.log"), &filenames));
        assert!(!matches_file_name(Path::new("app.log/notes.txt"), &filenames));

        let any = PatternMatcher::filenames::<&str>(&[]).unwrap();
        assert!(matches_file_name(Path::new("whatever.bin"), &any));
    }

    #[test]
    fn test_walk_filters_by_name_recursively() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());

        let mut visited = collect(dir.path(), &["*.log"], None);
        visited.sort();
        assert_eq!(
            visited,
            vec![
                PathBuf::from(".hidden/secret.log"),
                PathBuf::from("app.log"),
                PathBuf::from("nested/deeper/trace.log"),
                PathBuf::from("nested/server.log"),
            ]
        );
    }

    #[test]
    fn test_walk_patterns_are_alternatives() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());

        let visited = collect(dir.path(), &["app*", "*.txt"], None);
        assert_eq!(visited.len(), 2);
        assert!(visited.contains(&PathBuf::from("app.log")));
        assert!(visited.contains(&PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_walk_without_patterns_visits_everything() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());

        let visited = collect(dir.path(), &[], None);
        assert_eq!(visited.len(), 6);
    }

    #[test]
    fn test_walk_single_file_root() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());

        let file = dir.path().join("app.log");
        assert_eq!(collect(&file, &["*.log"], None), vec![PathBuf::from("app.log")]);
        assert!(collect(&file, &["*.txt"], None).is_empty());
    }

    #[test]
    fn test_walk_skips_excluded_directory() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());

        let visited = collect(dir.path(), &["*.log"], Some(&dir.path().join("nested")));
        assert_eq!(visited.len(), 2);
        assert!(visited.iter().all(|p| !p.starts_with("nested")));
    }

    #[test]
    fn test_walk_stops_on_visitor_error() {
        let dir = tempdir().unwrap();
        create_tree(dir.path());

        let filenames = PatternMatcher::filenames(&["*.log"]).unwrap();
        let mut calls = 0;
        let result = walk_files(dir.path(), &filenames, None, |_| {
            calls += 1;
            Err(crate::errors::ParseError::config_error("stop"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_counts_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        create_tree(dir.path());
        let locked = dir.path().join("nested");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running with privileges that ignore permissions
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let filenames = PatternMatcher::filenames(&["*.log"]).unwrap();
        let mut visited = Vec::new();
        let skipped = walk_files(dir.path(), &filenames, None, |path| {
            visited.push(relative_to_root(dir.path(), path));
            Ok(())
        });
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(skipped.unwrap() > 0);
        assert_eq!(
            visited,
            vec![PathBuf::from(".hidden/secret.log"), PathBuf::from("app.log")]
        );
    }

    #[test]
    fn test_relative_to_root() {
        let root = Path::new("/var/log");
        assert_eq!(
            relative_to_root(root, Path::new("/var/log/app/a.log")),
            PathBuf::from("app/a.log")
        );
        assert_eq!(
            relative_to_root(Path::new("/var/log/a.log"), Path::new("/var/log/a.log")),
            PathBuf::from("a.log")
        );
    }
}
