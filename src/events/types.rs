//! Event type definitions for progress reporting.

use crate::core::planner::{OperationKind, OperationStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the snaptidy pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Content hashing and fingerprinting events
    Fingerprint(FingerprintEvent),
    /// Duplicate clustering events
    Cluster(ClusterEvent),
    /// Operation execution events (including dry runs)
    Execute(ExecuteEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// An entry was skipped but scanning continues
    Warning { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of files found so far
    pub files_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events during the fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total_files: usize },
    /// Progress update during fingerprinting
    Progress(FingerprintProgress),
    /// A file could not be hashed and is excluded from clustering
    ///
    /// `completed` counts failures too, like [`FingerprintProgress::completed`].
    Failed {
        path: PathBuf,
        message: String,
        completed: usize,
    },
    /// Fingerprinting completed
    Completed { total_hashed: usize, failures: usize },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProgress {
    /// Number of files processed so far
    pub completed: usize,
    /// Total number of files to process
    pub total: usize,
    /// File that was just processed
    pub current_path: PathBuf,
}

/// Events from the clustering phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// Clustering completed
    Completed {
        total_groups: usize,
        duplicate_files: usize,
        reclaimable_bytes: u64,
    },
}

/// Events while applying (or previewing) operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecuteEvent {
    /// Execution has started
    Started { total_operations: usize, dry_run: bool },
    /// An operation is about to be applied
    OperationStarted {
        sequence: u64,
        kind: OperationKind,
        source: PathBuf,
    },
    /// An operation reached its final status
    OperationFinished {
        sequence: u64,
        status: OperationStatus,
        message: Option<String>,
    },
    /// Dry run: an operation that would have been applied
    WouldApply {
        sequence: u64,
        kind: OperationKind,
        source: PathBuf,
        destination: Option<PathBuf>,
    },
    /// Execution completed
    Completed {
        committed: usize,
        failed: usize,
        skipped: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// The operation plan is complete and about to be applied or previewed
    PlanReady { operations: usize, total_bytes: u64 },
    /// Pipeline completed
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled between operations
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Fingerprinting,
    Clustering,
    Planning,
    Executing,
    Recovering,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total files scanned
    pub total_files: usize,
    /// Number of operations in the plan
    pub planned: usize,
    /// Operations that were applied successfully
    pub committed: usize,
    /// Operations that failed
    pub failed: usize,
    /// Non-fatal problems recorded during the run
    pub warnings: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Clustering => write!(f, "Clustering"),
            PipelinePhase::Planning => write!(f, "Planning"),
            PipelinePhase::Executing => write!(f, "Executing"),
            PipelinePhase::Recovering => write!(f, "Recovering"),
        }
    }
}
