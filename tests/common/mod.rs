//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use snaptidy::core::hasher::{Fingerprint, PerceptualFingerprinter};
use snaptidy::core::metadata::CaptureDateProvider;
use snaptidy::core::scanner::{FileScanner, MediaKind, ScanConfig, ScanResult, WalkDirScanner};
use snaptidy::error::ScanError;
use snaptidy::events::EventSender;
use std::collections::HashMap;
use std::path::Path;

/// One-byte fingerprints looked up by file name
#[derive(Debug, Clone, Default)]
pub struct NamedFingerprints(HashMap<String, u8>);

impl NamedFingerprints {
    pub fn new(entries: &[(&str, u8)]) -> Self {
        Self(entries.iter().map(|(name, bits)| (name.to_string(), *bits)).collect())
    }
}

impl PerceptualFingerprinter for NamedFingerprints {
    fn fingerprint(&self, path: &Path, _kind: MediaKind) -> Option<Fingerprint> {
        let name = path.file_name()?.to_str()?;
        self.0.get(name).map(|bits| Fingerprint::new(vec![*bits]))
    }
}

/// Capture dates looked up by file name
#[derive(Debug, Clone, Default)]
pub struct NamedDates(HashMap<String, NaiveDateTime>);

impl NamedDates {
    pub fn new(entries: &[(&str, (i32, u32, u32))]) -> Self {
        Self(
            entries
                .iter()
                .map(|(name, (y, m, d))| {
                    let date = NaiveDate::from_ymd_opt(*y, *m, *d)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap();
                    (name.to_string(), date)
                })
                .collect(),
        )
    }
}

impl CaptureDateProvider for NamedDates {
    fn capture_date(&self, path: &Path, _kind: MediaKind) -> Option<NaiveDateTime> {
        let name = path.file_name()?.to_str()?;
        self.0.get(name).copied()
    }
}

/// Walks the real tree but treats the named files as unreadable
///
/// Permission bits do not stop a root user, so tests that need an
/// unreadable entry fake it here.
#[derive(Debug, Clone, Default)]
pub struct LockedFiles(Vec<String>);

impl LockedFiles {
    pub fn new(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }

    fn is_locked(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.0.iter().any(|locked| locked == n))
            .unwrap_or(false)
    }
}

impl FileScanner for LockedFiles {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &snaptidy::events::null_sender())
    }

    fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        let walked = WalkDirScanner::new(ScanConfig::default()).scan_with_events(root, events)?;
        let mut result = ScanResult {
            files: Vec::new(),
            warnings: walked.warnings,
        };
        for file in walked.files {
            if self.is_locked(&file.path) {
                result.warnings.push(ScanError::PermissionDenied { path: file.path });
            } else {
                result.files.push(file);
            }
        }
        Ok(result)
    }
}

/// Every file under `root` with its content, relative paths sorted
pub fn tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with("snaptidy_"))
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_string_lossy().to_string();
            (relative, std::fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}
