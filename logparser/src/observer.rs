use std::path::Path;
use tracing::info;

/// Receives a notification for every file that produced output.
///
/// The engine calls [`FileObserver::file_matched`] once per file, with the
/// path relative to the input root, as soon as the first line of that file is
/// selected. Closures taking `&Path` implement the trait.
pub trait FileObserver {
    fn file_matched(&mut self, relative_path: &Path);
}

impl<F> FileObserver for F
where
    F: FnMut(&Path),
{
    fn file_matched(&mut self, relative_path: &Path) {
        self(relative_path)
    }
}

/// Default observer: logs each matched file at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl FileObserver for LoggingObserver {
    fn file_matched(&mut self, relative_path: &Path) {
        info!("Found: {}", relative_path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_closure_observer() {
        let mut seen: Vec<PathBuf> = Vec::new();
        {
            let mut observer = |path: &Path| seen.push(path.to_path_buf());
            observer.file_matched(Path::new("a.log"));
            observer.file_matched(Path::new("nested/b.log"));
        }
        assert_eq!(
            seen,
            vec![PathBuf::from("a.log"), PathBuf::from("nested/b.log")]
        );
    }

    #[test]
    fn test_logging_observer_is_silent_without_subscriber() {
        let mut observer = LoggingObserver;
        observer.file_matched(Path::new("a.log"));
    }
}
