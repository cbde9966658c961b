//! # Error Module
//!
//! Error types for the snaptidy engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, sizes, what went wrong
//! - **Per-file problems are not run failures** - they are recorded as
//!   diagnostics and the batch keeps going
//! - **Fatal only for whole-run preconditions** - bad configuration, a
//!   missing root, no room for a bulk copy, an unwritable transaction log

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SnapTidyError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Execution error: {0}")]
    Execute(#[from] ExecuteError),

    #[error("Transaction log error: {0}")]
    Journal(#[from] JournalError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while walking a directory tree
///
/// `RootNotFound` and `NotADirectory` abort the scan. Every other variant is
/// reported as a warning for a single entry and the walk continues.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read entry {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is not readable, skipping {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Whether this error stops the whole scan
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::RootNotFound { .. } | ScanError::NotADirectory { .. }
        )
    }

    /// Path the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanError::RootNotFound { path }
            | ScanError::NotADirectory { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadEntry { path, .. }
            | ScanError::Unreadable { path, .. } => path,
        }
    }
}

/// Errors that occur while computing content digests
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to hash {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not start hashing worker pool: {0}")]
    WorkerPool(String),
}

/// Errors that occur while building an operation plan
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Invalid folder {path}: {reason}")]
    InvalidFolder { path: PathBuf, reason: String },
}

/// Errors that occur while applying operations
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error(
        "Not enough free space at {path}: {required} bytes needed, {available} bytes available"
    )]
    SpaceInsufficient {
        path: PathBuf,
        required: u64,
        available: u64,
    },

    #[error("Source file no longer exists: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Source file changed since it was recorded: {path} ({expected} bytes expected, {actual} found)")]
    SourceChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Source file content changed since it was recorded: {path}")]
    ContentChanged { path: PathBuf },

    #[error("Refusing to overwrite existing file: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Operation #{sequence} has no destination")]
    MissingDestination { sequence: u64 },

    #[error("Copy verification failed for {path}: source {expected} bytes, destination {actual} bytes")]
    CopyVerification {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Filesystem error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transaction log error: {0}")]
    Journal(#[from] JournalError),
}

/// Errors that occur with the transaction log
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Failed to open transaction log at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write transaction log at {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to read transaction log at {path}: {reason}")]
    Read { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SnapTidyError>;
