//! # Keeper Module
//!
//! Picks the one member of each cluster that stays put.
//!
//! The order is total and depends only on record values:
//! 1. Higher quality score
//! 2. Larger file size
//! 3. Lexicographically earliest path, comparing the directory, then the
//!    file stem, then the extension (so `IMG_0123.jpg` sorts before
//!    `IMG_0123 (1).jpg`)
//!
//! Paths are unique within a snapshot, so there is always exactly one
//! winner and rerunning on the same records picks the same file.

use crate::core::comparator::{Cluster, GroupKind};
use crate::core::record::FileRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::Path;

/// A cluster with its keeper chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Members in path order
    pub members: Vec<FileRecord>,
    /// Index of the keeper in `members`
    pub keeper_index: usize,
    pub kind: GroupKind,
    pub max_distance: f64,
}

impl DuplicateGroup {
    /// The retained record
    pub fn keeper(&self) -> &FileRecord {
        &self.members[self.keeper_index]
    }

    /// Every member except the keeper, in path order
    pub fn duplicates(&self) -> impl Iterator<Item = &FileRecord> {
        self.members
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.keeper_index)
            .map(|(_, r)| r)
    }

    /// Get the number of duplicates (excluding the keeper)
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Bytes freed by removing every non-keeper
    pub fn reclaimable_bytes(&self) -> u64 {
        self.duplicates().map(|r| r.size).sum()
    }
}

fn path_key(path: &Path) -> (Option<&Path>, Option<&OsStr>, Option<&OsStr>) {
    (path.parent(), path.file_stem(), path.extension())
}

/// Chooses keepers
#[derive(Debug, Clone, Copy, Default)]
pub struct KeeperSelector;

impl KeeperSelector {
    pub fn new() -> Self {
        Self
    }

    /// `Less` when `a` should be kept over `b`
    pub fn rank(a: &FileRecord, b: &FileRecord) -> Ordering {
        b.quality
            .cmp(&a.quality)
            .then_with(|| b.size.cmp(&a.size))
            .then_with(|| path_key(&a.path).cmp(&path_key(&b.path)))
    }

    /// Choose the keeper for one cluster
    pub fn select(&self, cluster: Cluster) -> DuplicateGroup {
        let keeper_index = cluster
            .members
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| Self::rank(a, b))
            .map(|(i, _)| i)
            .unwrap_or(0);

        DuplicateGroup {
            members: cluster.members,
            keeper_index,
            kind: cluster.kind,
            max_distance: cluster.max_distance,
        }
    }

    /// Choose keepers for every cluster
    pub fn select_all(&self, clusters: Vec<Cluster>) -> Vec<DuplicateGroup> {
        let groups: Vec<DuplicateGroup> = clusters.into_iter().map(|c| self.select(c)).collect();
        for group in &groups {
            tracing::debug!(
                "Keeping {} over {} duplicate(s)",
                group.keeper().path.display(),
                group.duplicate_count()
            );
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ContentHash;
    use crate::core::quality::QualityScore;
    use crate::core::scanner::MediaKind;
    use std::path::PathBuf;

    fn record(path: &str, size: u64, quality: u128) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            size,
            kind: MediaKind::Image,
            exact_hash: ContentHash::of_bytes(b"x"),
            fingerprint: None,
            dimensions: None,
            capture_date: None,
            quality: QualityScore(quality),
        }
    }

    fn cluster(members: Vec<FileRecord>) -> Cluster {
        Cluster {
            members,
            kind: GroupKind::Exact,
            max_distance: 0.0,
        }
    }

    #[test]
    fn highest_quality_wins() {
        let group = KeeperSelector::new().select(cluster(vec![
            record("/a.jpg", 100, 10),
            record("/b.jpg", 50, 99),
        ]));
        assert_eq!(group.keeper().path, PathBuf::from("/b.jpg"));
    }

    #[test]
    fn size_breaks_quality_ties() {
        let group = KeeperSelector::new().select(cluster(vec![
            record("/a.jpg", 100, 10),
            record("/b.jpg", 200, 10),
        ]));
        assert_eq!(group.keeper().path, PathBuf::from("/b.jpg"));
    }

    #[test]
    fn earliest_path_breaks_remaining_ties() {
        let group = KeeperSelector::new().select(cluster(vec![
            record("/b.jpg", 100, 10),
            record("/a.jpg", 100, 10),
            record("/c.jpg", 100, 10),
        ]));
        assert_eq!(group.keeper().path, PathBuf::from("/a.jpg"));
    }

    #[test]
    fn plain_name_beats_numbered_copy() {
        let group = KeeperSelector::new().select(cluster(vec![
            record("/p/IMG_0123 (1).jpg", 100, 10),
            record("/p/IMG_0123.jpg", 100, 10),
        ]));
        assert_eq!(group.keeper().path, PathBuf::from("/p/IMG_0123.jpg"));
    }

    #[test]
    fn duplicates_exclude_keeper() {
        let group = KeeperSelector::new().select(cluster(vec![
            record("/a.jpg", 10, 1),
            record("/b.jpg", 30, 3),
            record("/c.jpg", 20, 2),
        ]));

        let dupes: Vec<_> = group.duplicates().map(|r| r.path.clone()).collect();
        assert_eq!(dupes, vec![PathBuf::from("/a.jpg"), PathBuf::from("/c.jpg")]);
        assert_eq!(group.reclaimable_bytes(), 30);
        assert_eq!(group.duplicate_count(), 2);
    }

    #[test]
    fn selection_is_reproducible() {
        let members = vec![record("/x.jpg", 5, 5), record("/y.jpg", 5, 5)];
        let first = KeeperSelector::new().select(cluster(members.clone()));
        let second = KeeperSelector::new().select(cluster(members));
        assert_eq!(first, second);
    }
}
