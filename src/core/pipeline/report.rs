//! What a finished run hands back to the caller.

use crate::core::context::{Diagnostics, RunStatus, RunSummary};
use crate::core::executor::ExecutionReport;
use crate::core::journal::{LogEntry, TransactionLog};
use crate::core::keeper::DuplicateGroup;
use crate::core::planner::{Plan, RunKind};
use crate::error::JournalError;
use crate::events::PipelineSummary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Result of a pipeline or recovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub run: RunKind,
    pub root: PathBuf,
    /// The plan as built, every operation still `planned`
    pub plan: Plan,
    /// Duplicate groups (dedup only)
    pub groups: Vec<DuplicateGroup>,
    pub execution: ExecutionReport,
    pub diagnostics: Diagnostics,
    /// Logged deletes that recovery could not undo
    pub unrecoverable: Vec<LogEntry>,
    pub summary: RunSummary,
    /// Transaction log written by this run, if logging was on
    pub log_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl RunReport {
    /// Events-facing summary
    pub fn pipeline_summary(&self) -> PipelineSummary {
        PipelineSummary {
            total_files: self.summary.files_scanned,
            planned: self.summary.planned,
            committed: self.summary.committed,
            failed: self.summary.failed,
            warnings: self.diagnostics.len(),
            duration_ms: self.duration_ms,
        }
    }

    pub(crate) fn log_outcome(&self) {
        let s = &self.summary;
        if s.dry_run {
            tracing::info!(
                "Dry run of {}: {} operations planned, nothing changed",
                self.run,
                s.planned
            );
        } else {
            tracing::info!(
                "{} finished ({}): {} committed, {} failed, {} skipped in {}ms",
                self.run,
                s.status,
                s.committed,
                s.failed,
                s.skipped,
                self.duration_ms
            );
        }
        for category in crate::core::context::FailureCategory::ALL {
            let count = s.failures.get(category);
            if count > 0 {
                tracing::warn!("{}: {}", category, count);
            }
        }
    }
}

pub(crate) fn summarize(
    files_scanned: usize,
    files_hashed: usize,
    groups: &[DuplicateGroup],
    plan: &Plan,
    execution: &ExecutionReport,
    diagnostics: &Diagnostics,
) -> RunSummary {
    RunSummary {
        files_scanned,
        files_hashed,
        duplicate_groups: groups.len(),
        reclaimable_bytes: groups.iter().map(|g| g.reclaimable_bytes()).sum(),
        planned: plan.len(),
        committed: execution.committed,
        failed: execution.failed,
        skipped: execution.skipped,
        unrecoverable: 0,
        bytes_moved: execution.bytes_moved,
        bytes_copied: execution.bytes_copied,
        bytes_deleted: execution.bytes_deleted,
        dry_run: execution.dry_run,
        failures: diagnostics.counts(),
        status: RunStatus::from_outcome(execution.cancelled, diagnostics.len()),
    }
}

/// Sequence number a new row appended to `path` would get
pub(crate) fn next_sequence_in(path: &Path) -> Result<u64, JournalError> {
    let has_rows = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    if !has_rows {
        return Ok(1);
    }
    Ok(TransactionLog::read(path)?.max_sequence().map_or(1, |s| s + 1))
}

/// Make a log path absolute with a canonical parent so it can be matched
/// against scanned paths
pub(crate) fn normalize_log_path(path: PathBuf) -> PathBuf {
    let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
        return path;
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    match std::fs::canonicalize(&parent) {
        Ok(parent) => parent.join(name),
        Err(_) => path,
    }
}

/// Default location of the log a recovery run writes
pub(crate) fn recovery_log_path(replayed_log: &Path) -> PathBuf {
    let dir = match replayed_log.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    dir.join(RunKind::Recovery.log_file_name())
}
