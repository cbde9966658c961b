//! Structured outcome of a run.

use super::FailureCategory;
use serde::{Deserialize, Serialize};

/// Diagnostic counts, one field per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub scan_warning: usize,
    pub hash_failure: usize,
    pub space_insufficient: usize,
    pub operation_failure: usize,
    pub recovery_inconsistency: usize,
}

impl CategoryCounts {
    pub fn add(&mut self, category: FailureCategory) {
        *self.slot(category) += 1;
    }

    pub fn get(&self, category: FailureCategory) -> usize {
        match category {
            FailureCategory::ScanWarning => self.scan_warning,
            FailureCategory::HashFailure => self.hash_failure,
            FailureCategory::SpaceInsufficient => self.space_insufficient,
            FailureCategory::OperationFailure => self.operation_failure,
            FailureCategory::RecoveryInconsistency => self.recovery_inconsistency,
        }
    }

    pub fn total(&self) -> usize {
        FailureCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    fn slot(&mut self, category: FailureCategory) -> &mut usize {
        match category {
            FailureCategory::ScanWarning => &mut self.scan_warning,
            FailureCategory::HashFailure => &mut self.hash_failure,
            FailureCategory::SpaceInsufficient => &mut self.space_insufficient,
            FailureCategory::OperationFailure => &mut self.operation_failure,
            FailureCategory::RecoveryInconsistency => &mut self.recovery_inconsistency,
        }
    }
}

/// Overall exit state of a run that was not aborted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Success,
    SuccessWithWarnings,
    Cancelled,
}

impl RunStatus {
    pub fn from_outcome(cancelled: bool, warnings: usize) -> Self {
        if cancelled {
            RunStatus::Cancelled
        } else if warnings > 0 {
            RunStatus::SuccessWithWarnings
        } else {
            RunStatus::Success
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::SuccessWithWarnings => write!(f, "success with warnings"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Counts and byte totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_hashed: usize,
    pub duplicate_groups: usize,
    /// Bytes a dedup plan frees by removing non-keepers
    pub reclaimable_bytes: u64,
    pub planned: usize,
    pub committed: usize,
    pub failed: usize,
    /// Operations never attempted because the run was cancelled
    pub skipped: usize,
    /// Log entries that cannot be undone (recovery runs only)
    pub unrecoverable: usize,
    pub bytes_moved: u64,
    pub bytes_copied: u64,
    pub bytes_deleted: u64,
    pub dry_run: bool,
    pub failures: CategoryCounts,
    pub status: RunStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefers_cancelled() {
        assert_eq!(RunStatus::from_outcome(true, 3), RunStatus::Cancelled);
        assert_eq!(RunStatus::from_outcome(false, 3), RunStatus::SuccessWithWarnings);
        assert_eq!(RunStatus::from_outcome(false, 0), RunStatus::Success);
    }

    #[test]
    fn counts_round_trip_through_categories() {
        let mut counts = CategoryCounts::default();
        for category in FailureCategory::ALL {
            counts.add(category);
        }
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.get(FailureCategory::RecoveryInconsistency), 1);
    }
}
