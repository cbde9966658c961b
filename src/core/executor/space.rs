//! Free-space lookup.

use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Source of free-space figures
pub trait FreeSpace: Send + Sync {
    /// Bytes available to the volume holding `path`
    ///
    /// `path` may not exist yet; implementations look at its nearest
    /// existing ancestor.
    fn free_bytes(&self, path: &Path) -> u64;
}

impl<T: FreeSpace + ?Sized> FreeSpace for &T {
    fn free_bytes(&self, path: &Path) -> u64 {
        (**self).free_bytes(path)
    }
}

/// Reads free space from the operating system's mounted disks
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFreeSpace;

impl FreeSpace for SystemFreeSpace {
    fn free_bytes(&self, path: &Path) -> u64 {
        let probe = nearest_existing(path);
        let probe = probe.canonicalize().unwrap_or(probe);

        let disks = Disks::new_with_refreshed_list();
        let mut best: Option<(usize, u64)> = None;
        for disk in disks.list() {
            let mount = disk.mount_point();
            if probe.starts_with(mount) {
                let len = mount.as_os_str().len();
                if best.map_or(true, |(best_len, _)| len > best_len) {
                    best = Some((len, disk.available_space()));
                }
            }
        }

        match best {
            Some((_, available)) => available,
            None => {
                tracing::warn!(
                    "Could not determine free space for {}, assuming enough",
                    path.display()
                );
                u64::MAX
            }
        }
    }
}

/// A fixed amount of free space everywhere
#[derive(Debug, Clone, Copy)]
pub struct FixedFreeSpace(pub u64);

impl FreeSpace for FixedFreeSpace {
    fn free_bytes(&self, _path: &Path) -> u64 {
        self.0
    }
}

fn nearest_existing(path: &Path) -> PathBuf {
    let mut current = path;
    loop {
        if current.exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn nearest_existing_walks_up() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("a").join("b").join("c.jpg");
        assert_eq!(nearest_existing(&missing), dir.path());
    }

    #[test]
    fn fixed_free_space_ignores_path() {
        let space = FixedFreeSpace(42);
        assert_eq!(space.free_bytes(Path::new("/anywhere")), 42);
    }
}
