//! Entry filtering logic for the scanner.

use std::path::{Path, PathBuf};

/// Decides which directory entries the walk visits
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Paths pruned from the walk (directories are skipped with their contents)
    excluded: Vec<PathBuf>,
    /// Whether to include hidden files and directories
    include_hidden: bool,
}

impl EntryFilter {
    /// Create a filter that skips hidden entries and excludes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Exclude these paths, and everything below them, from the walk
    pub fn with_excluded(mut self, excluded: Vec<PathBuf>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Check if an entry at the given depth should be visited
    ///
    /// The root (depth 0) is always visited.
    pub fn should_visit(&self, path: &Path, depth: usize) -> bool {
        if depth == 0 {
            return true;
        }

        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        !self.excluded.iter().any(|excluded| path == excluded.as_path())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
