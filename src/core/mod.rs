//! # Core Module
//!
//! The front-end agnostic tidy-up engine.
//!
//! ## Modules
//! - `scanner` - Walks a directory tree into file entries
//! - `hasher` - Content digests and perceptual fingerprints
//! - `metadata` - Capture dates from EXIF
//! - `quality` - Scores used to pick keepers
//! - `record` - Immutable per-file records
//! - `comparator` - Groups duplicates and near-duplicates
//! - `keeper` - Picks the file each group keeps
//! - `planner` - Turns records into ordered operations
//! - `executor` - Applies operations (or previews them)
//! - `journal` - The CSV transaction log
//! - `recovery` - Reverses a transaction log
//! - `context` - Per-run state, diagnostics and summaries
//! - `pipeline` - Orchestrates the full workflow

pub mod comparator;
pub mod context;
pub mod executor;
pub mod hasher;
pub mod journal;
pub mod keeper;
pub mod metadata;
pub mod pipeline;
pub mod planner;
pub mod quality;
pub mod record;
pub mod recovery;
pub mod scanner;

// Re-export commonly used types
pub use comparator::{Cluster, Clusterer, GroupKind, Sensitivity};
pub use context::{CancellationToken, FailureCategory, RunContext, RunStatus, RunSummary};
pub use keeper::{DuplicateGroup, KeeperSelector};
pub use pipeline::{Pipeline, PipelineBuilder, Recovery, RunReport};
pub use planner::{DateLayout, Operation, OperationKind, Plan, PlanMode, Transfer};
pub use record::FileRecord;
pub use scanner::{MediaKind, ScannedFile};
