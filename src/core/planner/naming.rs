//! Collision-free destination names.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Hands out destination paths that are neither on disk nor already
/// reserved by an earlier operation in the same plan
///
/// A taken `photo.jpg` becomes `photo_1.jpg`, then `photo_2.jpg`, and so on.
#[derive(Debug, Default)]
pub struct UniqueNamer {
    reserved: HashSet<PathBuf>,
    // Next suffix to try per (parent, stem, ext), so many same-named files
    // do not rescan from 1 each time
    counters: HashMap<(PathBuf, String, String), usize>,
}

impl UniqueNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve and return a free path for `file_name` inside `dir`
    pub fn claim(&mut self, dir: &Path, file_name: &std::ffi::OsStr) -> PathBuf {
        let candidate = dir.join(file_name);
        if self.is_free(&candidate) {
            self.reserved.insert(candidate.clone());
            return candidate;
        }

        let name = Path::new(file_name);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let ext = name
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let key = (dir.to_path_buf(), stem.clone(), ext.clone());
        let counter = self.counters.entry(key).or_insert(1);

        loop {
            let new_name = if ext.is_empty() {
                format!("{}_{}", stem, counter)
            } else {
                format!("{}_{}.{}", stem, counter, ext)
            };
            *counter += 1;

            let path = dir.join(new_name);
            if !self.reserved.contains(&path) && !path.exists() {
                self.reserved.insert(path.clone());
                return path;
            }
        }
    }

    fn is_free(&self, path: &Path) -> bool {
        !self.reserved.contains(path) && !path.exists()
    }
}
