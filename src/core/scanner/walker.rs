//! Directory walking implementation using walkdir.
//!
//! walkdir keeps its own stack of open directories, so deep trees do not
//! grow the call stack.

use super::{filter::EntryFilter, FileScanner, MediaKind, ScanResult, ScannedFile};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Absolute paths pruned from the walk (duplicates folder, log files, ...)
    pub excluded: Vec<PathBuf>,
    /// Open each file once so unreadable files are reported during the scan
    pub probe_readable: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            excluded: Vec::new(),
            probe_readable: true,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: EntryFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = EntryFilter::new()
            .with_hidden(config.include_hidden)
            .with_excluded(config.excluded.clone());

        Self { config, filter }
    }

    /// Start a lazy walk of `root`
    ///
    /// Fails only if the root itself is missing or not a directory. Per-entry
    /// problems are yielded as `Err` items and the walk continues past them.
    pub fn walk(&self, root: &Path) -> Result<ScanIter, ScanError> {
        if !root.exists() {
            return Err(ScanError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let root = fs::canonicalize(root).map_err(|source| ScanError::ReadEntry {
            path: root.to_path_buf(),
            source,
        })?;

        let inner = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(ScanIter {
            inner,
            filter: self.filter.clone(),
            probe_readable: self.config.probe_readable,
            directories_scanned: 0,
            files_found: 0,
            current_dir: root,
        })
    }
}

/// Lazy sequence of scanned files
///
/// Each item is either a file or a non-fatal warning about an entry that
/// was skipped.
pub struct ScanIter {
    inner: walkdir::IntoIter,
    filter: EntryFilter,
    probe_readable: bool,
    directories_scanned: usize,
    files_found: usize,
    current_dir: PathBuf,
}

impl ScanIter {
    /// Number of directories entered so far
    pub fn directories_scanned(&self) -> usize {
        self.directories_scanned
    }

    /// Number of files yielded so far
    pub fn files_found(&self) -> usize {
        self.files_found
    }

    /// Directory most recently entered
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    fn read_file(&self, path: &Path) -> Result<ScannedFile, ScanError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| classify_io(path, e))?;

        if self.probe_readable {
            File::open(path).map_err(|source| match source.kind() {
                std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied {
                    path: path.to_path_buf(),
                },
                _ => ScanError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                },
            })?;
        }

        Ok(ScannedFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
            kind: MediaKind::from_path(path),
        })
    }
}

impl Iterator for ScanIter {
    type Item = Result<ScannedFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(classify_walk_error(e))),
            };

            let file_type = entry.file_type();

            if !self.filter.should_visit(entry.path(), entry.depth()) {
                if file_type.is_dir() {
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if file_type.is_dir() {
                self.directories_scanned += 1;
                self.current_dir = entry.path().to_path_buf();
                continue;
            }

            if file_type.is_symlink() {
                tracing::debug!("Not following symlink {}", entry.path().display());
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let result = self.read_file(entry.path());
            if result.is_ok() {
                self.files_found += 1;
            }
            return Some(result);
        }
    }
}

fn classify_io(path: &Path, error: std::io::Error) -> ScanError {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        ScanError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        ScanError::ReadEntry {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

fn classify_walk_error(error: walkdir::Error) -> ScanError {
    let path = error.path().map(|p| p.to_path_buf()).unwrap_or_default();

    if error.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        return ScanError::PermissionDenied { path };
    }

    let source = match error.into_io_error() {
        Some(io) => io,
        None => std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"),
    };
    ScanError::ReadEntry { path, source }
}

impl FileScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut iter = self.walk(root)?;
        let mut result = ScanResult::default();
        let mut last_reported_dirs = 0;

        while let Some(item) = iter.next() {
            match item {
                Ok(file) => result.files.push(file),
                Err(warning) => {
                    tracing::warn!("{}", warning);
                    events.send(Event::Scan(ScanEvent::Warning {
                        path: warning.path().clone(),
                        message: warning.to_string(),
                    }));
                    result.warnings.push(warning);
                }
            }

            if iter.directories_scanned() != last_reported_dirs {
                last_reported_dirs = iter.directories_scanned();
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned: last_reported_dirs,
                    files_found: iter.files_found(),
                    current_path: iter.current_dir().to_path_buf(),
                })));
            }
        }

        tracing::info!(
            "Found {} files in {} directories ({} skipped)",
            result.files.len(),
            iter.directories_scanned(),
            result.warnings.len()
        );

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: result.files.len(),
        }));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(temp_dir.path()).unwrap();

        assert!(result.files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn scan_includes_all_file_kinds() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.jpg", b"jpeg");
        create_file(temp_dir.path(), "clip.mov", b"mov");
        create_file(temp_dir.path(), "notes.txt", b"text");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 3);
        let kinds: Vec<_> = result.files.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&MediaKind::Image));
        assert!(kinds.contains(&MediaKind::Video));
        assert!(kinds.contains(&MediaKind::Other));
    }

    #[test]
    fn scan_records_sizes_and_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.bin", &[0u8; 42]);

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files[0].size, 42);
        assert!(result.files[0].path.is_absolute());
        assert_eq!(result.total_bytes(), 42);
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("2019").join("trip");
        fs::create_dir_all(&nested).unwrap();
        create_file(temp_dir.path(), "root.jpg", b"a");
        create_file(&nested, "nested.jpg", b"b");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 2);
    }

    #[test]
    fn walk_is_lazy_and_counts_progress() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.jpg", b"a");
        create_file(temp_dir.path(), "b.jpg", b"b");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let mut iter = scanner.walk(temp_dir.path()).unwrap();

        assert_eq!(iter.files_found(), 0);
        assert!(iter.next().unwrap().is_ok());
        assert_eq!(iter.files_found(), 1);
    }

    #[test]
    fn scan_excludes_hidden_files_by_default() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "visible.jpg", b"v");
        create_file(temp_dir.path(), ".hidden.jpg", b"h");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("visible.jpg"));
    }

    #[test]
    fn scan_prunes_excluded_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        let duplicates = root.join("duplicates");
        fs::create_dir(&duplicates).unwrap();
        create_file(&root, "keep.jpg", b"k");
        create_file(&duplicates, "moved.jpg", b"m");

        let config = ScanConfig {
            excluded: vec![duplicates],
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(&root).unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("keep.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn scan_does_not_follow_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let real = create_file(temp_dir.path(), "real.jpg", b"r");
        std::os::unix::fs::symlink(&real, temp_dir.path().join("link.jpg")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("loop")).unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn scan_nonexistent_directory_is_fatal() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(ScanError::RootNotFound { .. })));
    }

    #[test]
    fn scan_of_a_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_file(temp_dir.path(), "a.jpg", b"a");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&file);

        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }

    #[test]
    fn file_removed_during_walk_is_a_warning() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.jpg", b"a");
        create_file(temp_dir.path(), "b.jpg", b"b");
        let doomed = create_file(temp_dir.path(), "z.jpg", b"z");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let mut walk = scanner.walk(temp_dir.path()).unwrap();

        // The sorted listing is read before the first file is yielded
        let first = walk.next().unwrap().unwrap();
        assert!(first.path.ends_with("a.jpg"));
        fs::remove_file(&doomed).unwrap();

        let rest: Vec<_> = walk.collect();
        assert_eq!(rest.len(), 2);
        assert!(rest[0].as_ref().unwrap().path.ends_with("b.jpg"));
        match &rest[1] {
            Err(warning) => {
                assert!(!warning.is_fatal());
                assert!(warning.path().ends_with("z.jpg"));
            }
            Ok(file) => panic!("expected a warning, got {}", file.path.display()),
        }
    }
}
