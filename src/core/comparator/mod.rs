//! # Comparator Module
//!
//! Groups records that represent the same logical content.
//!
//! ## How It Works
//! 1. Records with the same content hash are linked (hard links, distance 0)
//! 2. Records with different hashes but fingerprints within the
//!    [`Sensitivity`] threshold are linked (soft links)
//! 3. Connected components over all links become clusters, so hard and
//!    soft groups that share a member are merged
//!
//! A record without a fingerprint can only ever join through its content
//! hash. Records come from a path-sorted [`RecordSnapshot`], and the
//! grouper roots every set at its smallest index, so the same snapshot
//! always yields the same clusters.

mod grouper;
mod sensitivity;

pub use grouper::{Component, Link, LinkKind, TransitiveGrouper};
pub use sensitivity::Sensitivity;

use crate::core::hasher::ContentHash;
use crate::core::record::{FileRecord, RecordSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which kinds of link hold a cluster together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    /// Byte-identical files only
    Exact,
    /// Perceptually similar files only
    Similar,
    /// Both
    Mixed,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Exact => write!(f, "Exact"),
            GroupKind::Similar => write!(f, "Similar"),
            GroupKind::Mixed => write!(f, "Exact + Similar"),
        }
    }
}

/// Records believed to be the same content, before a keeper is chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Members in path order, always at least two
    pub members: Vec<FileRecord>,
    pub kind: GroupKind,
    /// Largest fingerprint distance on any link inside the cluster
    pub max_distance: f64,
}

/// Finds duplicate clusters in a snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct Clusterer {
    sensitivity: Sensitivity,
}

impl Clusterer {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self { sensitivity }
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Every hard and soft link between records, by index
    pub fn links(&self, records: &[FileRecord]) -> Vec<Link> {
        let mut links = Vec::new();

        let mut first_with_hash: BTreeMap<ContentHash, usize> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            match first_with_hash.get(&record.exact_hash) {
                Some(&first) => links.push(Link {
                    a: first,
                    b: index,
                    kind: LinkKind::Exact,
                    distance: 0.0,
                }),
                None => {
                    first_with_hash.insert(record.exact_hash, index);
                }
            }
        }

        let fingerprinted: Vec<(usize, &FileRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.fingerprint.is_some())
            .collect();

        for (i, &(index_a, a)) in fingerprinted.iter().enumerate() {
            for &(index_b, b) in &fingerprinted[i + 1..] {
                if a.exact_hash == b.exact_hash {
                    continue;
                }
                let (Some(fa), Some(fb)) = (&a.fingerprint, &b.fingerprint) else {
                    continue;
                };
                if let Some(distance) = fa.distance(fb) {
                    if self.sensitivity.accepts(distance) {
                        links.push(Link {
                            a: index_a,
                            b: index_b,
                            kind: LinkKind::Similar,
                            distance,
                        });
                    }
                }
            }
        }

        links
    }

    /// Group the snapshot into clusters of two or more records
    pub fn cluster(&self, snapshot: &RecordSnapshot) -> Vec<Cluster> {
        let records = snapshot.records();
        let links = self.links(records);
        let components = TransitiveGrouper::new().group(records.len(), &links);

        let clusters: Vec<Cluster> = components
            .into_iter()
            .map(|component| Cluster {
                members: component
                    .members
                    .iter()
                    .map(|&index| records[index].clone())
                    .collect(),
                kind: component.kind,
                max_distance: component.max_distance,
            })
            .collect();

        tracing::info!(
            "Found {} duplicate groups among {} files (sensitivity {})",
            clusters.len(),
            records.len(),
            self.sensitivity
        );

        clusters
    }
}
