//! # Scanner Module
//!
//! Walks a directory tree once and lists the files found there.
//!
//! The scanner never touches file contents beyond an optional readability
//! probe and never mutates the filesystem. Symbolic links are not followed,
//! so link cycles cannot trap the walk.
//!
//! ## Media Kinds
//! - Images: jpg, jpeg, png, gif, bmp, tiff, tif, heic, heif, webp
//! - Videos: mp4, mov, avi, mkv, wmv, m4v, 3gp
//! - Everything else is `Other` and still takes part in exact-duplicate
//!   detection, flattening and organizing
//!
//! ## Example
//! ```rust,ignore
//! use snaptidy::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! for entry in scanner.walk(Path::new("/photos"))? {
//!     match entry {
//!         Ok(file) => println!("{}", file.path.display()),
//!         Err(warning) => eprintln!("skipped: {warning}"),
//!     }
//! }
//! ```

mod filter;
mod walker;

pub use filter::EntryFilter;
pub use walker::{ScanConfig, ScanIter, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file discovered by the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
    /// Media classification from the extension
    pub kind: MediaKind,
}

/// Broad media classification used to decide which collaborators apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Detect media kind from a file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "tif" | "heic" | "heif"
            | "webp" => MediaKind::Image,
            "mp4" | "mov" | "avi" | "mkv" | "wmv" | "m4v" | "3gp" => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }

    /// Detect media kind from a path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(MediaKind::from_extension)
            .unwrap_or(MediaKind::Other)
    }

    /// Whether perceptual fingerprints can exist for this kind
    pub fn is_media(&self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

/// Result of a complete scan
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Files discovered, in walk order
    pub files: Vec<ScannedFile>,
    /// Entries that were skipped (non-fatal)
    pub warnings: Vec<ScanError>,
}

impl ScanResult {
    /// Total bytes across all discovered files
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Trait for file scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait FileScanner: Send + Sync {
    /// Scan a root directory and collect everything found
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(&self, root: &Path, events: &EventSender)
        -> Result<ScanResult, ScanError>;
}
