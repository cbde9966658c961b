//! # Planner Module
//!
//! Turns a snapshot and its duplicate groups into an ordered list of file
//! operations for one mode.
//!
//! ## Modes
//! - **Flatten** - every file moves (or copies) into one target directory
//! - **Dedup** - every non-keeper is deleted or moved to a duplicates folder
//! - **Organize** - every file moves into a year or year-month folder
//!
//! ## Guarantees
//! - Sequence numbers are strictly increasing in plan order
//! - No destination collides with an existing file or another destination
//!   in the same plan (`stem_N.ext` suffixes)
//! - In safe mode no `Delete` survives planning
//! - A keeper is never the source of any dedup operation

mod naming;
mod planner;

pub use naming::UniqueNamer;
pub use planner::Planner;

use crate::core::hasher::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Folder used for duplicates in safe mode when none is configured
pub const DEFAULT_DUPLICATES_FOLDER: &str = "duplicates";

/// Folder used for copy-mode flatten when no output is configured
pub const DEFAULT_FLATTEN_OUTPUT: &str = "flattened";

/// What an operation does to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Move,
    Copy,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Move => "move",
            OperationKind::Copy => "copy",
            OperationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an operation
///
/// `Planned` moves to exactly one of `Committed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Planned,
    Committed,
    Failed,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Planned => "planned",
            OperationStatus::Committed => "committed",
            OperationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file operation
///
/// Everything but the status is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    sequence: u64,
    kind: OperationKind,
    source: PathBuf,
    destination: Option<PathBuf>,
    expected_size: u64,
    #[serde(default)]
    content_hash: Option<ContentHash>,
    status: OperationStatus,
}

impl Operation {
    pub fn move_file(sequence: u64, source: PathBuf, destination: PathBuf, expected_size: u64) -> Self {
        Self::new(sequence, OperationKind::Move, source, Some(destination), expected_size)
    }

    pub fn copy_file(sequence: u64, source: PathBuf, destination: PathBuf, expected_size: u64) -> Self {
        Self::new(sequence, OperationKind::Copy, source, Some(destination), expected_size)
    }

    pub fn delete_file(sequence: u64, source: PathBuf, expected_size: u64) -> Self {
        Self::new(sequence, OperationKind::Delete, source, None, expected_size)
    }

    fn new(
        sequence: u64,
        kind: OperationKind,
        source: PathBuf,
        destination: Option<PathBuf>,
        expected_size: u64,
    ) -> Self {
        Self {
            sequence,
            kind,
            source,
            destination,
            expected_size,
            content_hash: None,
            status: OperationStatus::Planned,
        }
    }

    /// Attach the digest of the source at plan time
    pub fn with_content_hash(mut self, hash: ContentHash) -> Self {
        self.content_hash = Some(hash);
        self
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Size of the source when the operation was planned
    pub fn expected_size(&self) -> u64 {
        self.expected_size
    }

    /// Digest of the source when the operation was planned, if known
    pub fn content_hash(&self) -> Option<ContentHash> {
        self.content_hash
    }

    pub fn status(&self) -> OperationStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: OperationStatus) {
        self.status = status;
    }

    /// Same operation under a different sequence number
    pub(crate) fn renumbered(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.destination {
            Some(destination) => write!(
                f,
                "#{} {} {} -> {}",
                self.sequence,
                self.kind,
                self.source.display(),
                destination.display()
            ),
            None => write!(f, "#{} {} {}", self.sequence, self.kind, self.source.display()),
        }
    }
}

/// Which command produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Flatten,
    Dedup,
    Organize,
    Recovery,
}

impl RunKind {
    pub const ALL: [RunKind; 4] = [
        RunKind::Flatten,
        RunKind::Dedup,
        RunKind::Organize,
        RunKind::Recovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Flatten => "flatten",
            RunKind::Dedup => "dedup",
            RunKind::Organize => "organize",
            RunKind::Recovery => "recovery",
        }
    }

    /// File name of this run's transaction log
    pub fn log_file_name(&self) -> String {
        format!("snaptidy_{}_log.csv", self.as_str())
    }
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Move or copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transfer {
    #[default]
    Move,
    Copy,
}

/// Folder naming for organize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateLayout {
    /// `2021/`
    #[default]
    Year,
    /// `202102/`
    YearMonth,
}

impl DateLayout {
    /// Folder name for a capture date
    pub fn folder_name(&self, date: &chrono::NaiveDateTime) -> String {
        match self {
            DateLayout::Year => date.format("%Y").to_string(),
            DateLayout::YearMonth => date.format("%Y%m").to_string(),
        }
    }

    /// Whether a folder name already looks like this layout's output
    pub fn matches_folder(&self, name: &str) -> bool {
        let digits = match self {
            DateLayout::Year => 4,
            DateLayout::YearMonth => 6,
        };
        name.len() == digits && name.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Mode-specific planning options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanMode {
    Flatten {
        transfer: Transfer,
        /// Target directory; the root for moves and `<root>/flattened` for
        /// copies when absent
        output: Option<PathBuf>,
    },
    Dedup {
        duplicates_folder: Option<PathBuf>,
    },
    Organize {
        layout: DateLayout,
        unclassified_folder: Option<PathBuf>,
    },
}

impl PlanMode {
    pub fn run_kind(&self) -> RunKind {
        match self {
            PlanMode::Flatten { .. } => RunKind::Flatten,
            PlanMode::Dedup { .. } => RunKind::Dedup,
            PlanMode::Organize { .. } => RunKind::Organize,
        }
    }

    /// Only dedup needs duplicate groups
    pub fn needs_groups(&self) -> bool {
        matches!(self, PlanMode::Dedup { .. })
    }

    /// Only organize needs capture dates
    pub fn needs_capture_dates(&self) -> bool {
        matches!(self, PlanMode::Organize { .. })
    }
}

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub mode: PlanMode,
    /// Rewrite every delete into a move to the duplicates folder
    pub safe_mode: bool,
    /// Sequence number of the first operation
    pub first_sequence: u64,
}

impl PlannerConfig {
    pub fn new(mode: PlanMode) -> Self {
        Self {
            mode,
            safe_mode: false,
            first_sequence: 1,
        }
    }

    pub fn safe_mode(mut self, enabled: bool) -> Self {
        self.safe_mode = enabled;
        self
    }

    pub fn first_sequence(mut self, sequence: u64) -> Self {
        self.first_sequence = sequence;
        self
    }
}

/// An ordered, immutable list of operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub run: RunKind,
    pub root: PathBuf,
    pub operations: Vec<Operation>,
    /// Whole plan is a bulk copy; a space shortfall aborts it up front
    pub bulk_copy: bool,
}

impl Plan {
    pub fn new(run: RunKind, root: PathBuf) -> Self {
        Self {
            run,
            root,
            operations: Vec::new(),
            bulk_copy: false,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn is_recovery(&self) -> bool {
        self.run == RunKind::Recovery
    }

    pub fn count_of(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind() == kind).count()
    }

    /// Bytes touched by the plan
    pub fn total_bytes(&self) -> u64 {
        self.operations.iter().map(|op| op.expected_size()).sum()
    }

    /// Bytes that copies will add to the disk
    pub fn copy_bytes(&self) -> u64 {
        self.operations
            .iter()
            .filter(|op| op.kind() == OperationKind::Copy)
            .map(|op| op.expected_size())
            .sum()
    }

    /// Sequence number just past the last operation
    pub fn next_sequence(&self) -> Option<u64> {
        self.operations.last().map(|op| op.sequence() + 1)
    }
}
