//! # Context Module
//!
//! Per-run state passed explicitly from the scanner to the executor.
//!
//! There is no process-wide state: the event sender, the cancellation
//! flag, the accumulated diagnostics and the log writer all live in one
//! [`RunContext`] owned by the caller.

mod summary;

pub use summary::{CategoryCounts, RunStatus, RunSummary};

use crate::core::journal::TransactionLogWriter;
use crate::events::{null_sender, EventSender};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag checked between operations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the current operation still finishes
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Kinds of non-fatal problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// An entry could not be read during the scan
    ScanWarning,
    /// A file could not be hashed and was left out of clustering
    HashFailure,
    /// Not enough free space for a copy
    SpaceInsufficient,
    /// A filesystem call failed while applying an operation
    OperationFailure,
    /// A recovery step no longer matches what the log recorded
    RecoveryInconsistency,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 5] = [
        FailureCategory::ScanWarning,
        FailureCategory::HashFailure,
        FailureCategory::SpaceInsufficient,
        FailureCategory::OperationFailure,
        FailureCategory::RecoveryInconsistency,
    ];
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCategory::ScanWarning => write!(f, "Scan warning"),
            FailureCategory::HashFailure => write!(f, "Hash failure"),
            FailureCategory::SpaceInsufficient => write!(f, "Insufficient space"),
            FailureCategory::OperationFailure => write!(f, "Operation failure"),
            FailureCategory::RecoveryInconsistency => write!(f, "Recovery inconsistency"),
        }
    }
}

/// One non-fatal problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: FailureCategory,
    pub path: PathBuf,
    pub message: String,
}

/// Ordered collection of diagnostics for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: FailureCategory, path: &Path, message: impl Into<String>) {
        self.items.push(Diagnostic {
            category,
            path: path.to_path_buf(),
            message: message.into(),
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, category: FailureCategory) -> usize {
        self.items.iter().filter(|d| d.category == category).count()
    }

    pub fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for item in &self.items {
            counts.add(item.category);
        }
        counts
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Everything a run carries from stage to stage
///
/// Fields are public so stages can borrow them independently, for example
/// the log writer mutably while reading the cancellation token.
#[derive(Debug)]
pub struct RunContext {
    pub events: EventSender,
    pub cancel: CancellationToken,
    pub diagnostics: Diagnostics,
    pub journal: Option<TransactionLogWriter>,
}

impl RunContext {
    pub fn new(events: EventSender, cancel: CancellationToken) -> Self {
        Self {
            events,
            cancel,
            diagnostics: Diagnostics::new(),
            journal: None,
        }
    }

    /// Attach a log writer
    pub fn with_journal(mut self, journal: TransactionLogWriter) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Path of the attached log, if any
    pub fn journal_path(&self) -> Option<&Path> {
        self.journal.as_ref().map(|j| j.path())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(null_sender(), CancellationToken::new())
    }
}
