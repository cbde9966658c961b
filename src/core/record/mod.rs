//! # Record Module
//!
//! The immutable per-file value every later stage works from.
//!
//! A [`FileRecord`] is built exactly once, after the file's content digest
//! has been computed, and is never changed afterwards. It describes what
//! the file looked like at that moment; it is not a handle to the live
//! filesystem.

use crate::core::hasher::{ContentHash, Fingerprint};
use crate::core::quality::{Dimensions, QualityScore};
use crate::core::scanner::MediaKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the engine knows about one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Media classification
    pub kind: MediaKind,
    /// Whole-file digest, computed once
    pub exact_hash: ContentHash,
    /// Perceptual fingerprint, absent for non-media or undecodable files
    pub fingerprint: Option<Fingerprint>,
    /// Pixel dimensions, when known
    pub dimensions: Option<Dimensions>,
    /// Capture timestamp from metadata, when known
    pub capture_date: Option<NaiveDateTime>,
    /// Derived quality score used for keeper selection
    pub quality: QualityScore,
}

impl FileRecord {
    /// File name component of the path
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    /// Directory containing the file
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}

/// Immutable, path-sorted set of records for one run
///
/// Later stages only ever see shared references into the snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    records: Vec<FileRecord>,
}

impl RecordSnapshot {
    /// Freeze a set of records, sorting by path and dropping repeated paths
    pub fn new(mut records: Vec<FileRecord>) -> Self {
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records.dedup_by(|a, b| a.path == b.path);
        Self { records }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordSnapshot {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
