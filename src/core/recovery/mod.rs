//! # Recovery Module
//!
//! Builds the plan that undoes a logged run.
//!
//! Committed entries are reversed newest first:
//!
//! | Logged     | Undo                      |
//! |------------|---------------------------|
//! | Move a → b | Move b → a                |
//! | Copy a → b | Delete b                  |
//! | Delete a   | none, reported            |
//!
//! Every undo step carries the size and content hash the log recorded, so
//! a file that was changed or replaced since the run is caught by the
//! executor and that one step is skipped.

use crate::core::journal::{LogEntry, TransactionLog};
use crate::core::planner::{Operation, OperationKind, Plan, RunKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Undo plan plus what could not go into it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub plan: Plan,
    /// Committed deletes, which cannot be reversed
    pub unrecoverable: Vec<LogEntry>,
    /// Entries with no recorded outcome
    pub unresolved: Vec<LogEntry>,
    /// Log rows that could not be parsed
    pub skipped_rows: usize,
}

/// Reverses transaction logs
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryGenerator;

impl RecoveryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the undo plan for `log`, numbering steps from `first_sequence`
    pub fn generate(&self, log: &TransactionLog, root: PathBuf, first_sequence: u64) -> RecoveryPlan {
        let mut plan = Plan::new(RunKind::Recovery, root);
        let mut unrecoverable = Vec::new();

        for entry in log.committed().rev() {
            let sequence = first_sequence + plan.operations.len() as u64;
            let undo = match (entry.kind, &entry.destination) {
                (OperationKind::Move, Some(destination)) => Some(Operation::move_file(
                    sequence,
                    destination.clone(),
                    entry.source.clone(),
                    entry.size,
                )),
                (OperationKind::Copy, Some(destination)) => Some(Operation::delete_file(
                    sequence,
                    destination.clone(),
                    entry.size,
                )),
                (OperationKind::Delete, _) => {
                    tracing::warn!(
                        "Cannot undo deletion of {} (#{})",
                        entry.source.display(),
                        entry.sequence
                    );
                    unrecoverable.push(entry.clone());
                    None
                }
                (kind, None) => {
                    tracing::warn!(
                        "Logged {} #{} has no destination, cannot undo",
                        kind,
                        entry.sequence
                    );
                    unrecoverable.push(entry.clone());
                    None
                }
            };

            if let Some(undo) = undo {
                plan.operations.push(match entry.hash {
                    Some(hash) => undo.with_content_hash(hash),
                    None => undo,
                });
            }
        }

        let unresolved: Vec<LogEntry> = log.unresolved().cloned().collect();
        if !unresolved.is_empty() {
            tracing::warn!(
                "{} logged operations never recorded an outcome and are left as they are",
                unresolved.len()
            );
        }

        tracing::info!(
            "Recovery plan: {} steps, {} unrecoverable",
            plan.len(),
            unrecoverable.len()
        );

        RecoveryPlan {
            plan,
            unrecoverable,
            unresolved,
            skipped_rows: log.skipped_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::journal::TransactionLogWriter;
    use crate::core::planner::OperationStatus;
    use tempfile::TempDir;

    fn log_with(ops: &[(Operation, OperationStatus)]) -> (TempDir, TransactionLog) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        let mut writer = TransactionLogWriter::open(&path).unwrap();
        for (op, status) in ops {
            writer.record(op, OperationStatus::Planned).unwrap();
            writer.record(op, *status).unwrap();
        }
        drop(writer);
        let log = TransactionLog::read(&path).unwrap();
        (dir, log)
    }

    #[test]
    fn reverses_committed_entries_newest_first() {
        let (dir, log) = log_with(&[
            (
                Operation::move_file(1, "/p/a.jpg".into(), "/p/2021/a.jpg".into(), 1),
                OperationStatus::Committed,
            ),
            (
                Operation::copy_file(2, "/p/b.jpg".into(), "/p/out/b.jpg".into(), 2),
                OperationStatus::Committed,
            ),
            (
                Operation::move_file(3, "/p/c.jpg".into(), "/p/2021/c.jpg".into(), 3),
                OperationStatus::Failed,
            ),
        ]);

        let recovery = RecoveryGenerator::new().generate(&log, dir.path().to_path_buf(), 10);
        let ops = &recovery.plan.operations;

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind(), OperationKind::Delete);
        assert_eq!(ops[0].source(), std::path::Path::new("/p/out/b.jpg"));
        assert_eq!(ops[0].sequence(), 10);
        assert_eq!(ops[1].kind(), OperationKind::Move);
        assert_eq!(ops[1].source(), std::path::Path::new("/p/2021/a.jpg"));
        assert_eq!(ops[1].destination(), Some(std::path::Path::new("/p/a.jpg")));
        assert_eq!(ops[1].sequence(), 11);
        assert!(recovery.plan.is_recovery());
    }

    #[test]
    fn deletes_are_reported_as_unrecoverable() {
        let (dir, log) = log_with(&[(
            Operation::delete_file(1, "/p/a.jpg".into(), 1),
            OperationStatus::Committed,
        )]);

        let recovery = RecoveryGenerator::new().generate(&log, dir.path().to_path_buf(), 1);

        assert!(recovery.plan.is_empty());
        assert_eq!(recovery.unrecoverable.len(), 1);
    }

    #[test]
    fn undo_steps_carry_the_logged_hash() {
        let hash = crate::core::hasher::ContentHash::of_bytes(b"a");
        let (dir, log) = log_with(&[
            (
                Operation::move_file(1, "/p/a.jpg".into(), "/p/2021/a.jpg".into(), 1)
                    .with_content_hash(hash),
                OperationStatus::Committed,
            ),
            (
                Operation::move_file(2, "/p/b.jpg".into(), "/p/2021/b.jpg".into(), 1),
                OperationStatus::Committed,
            ),
        ]);

        let recovery = RecoveryGenerator::new().generate(&log, dir.path().to_path_buf(), 1);
        let ops = &recovery.plan.operations;

        assert_eq!(ops[0].content_hash(), None);
        assert_eq!(ops[1].content_hash(), Some(hash));
    }

    #[test]
    fn empty_log_gives_empty_plan() {
        let recovery =
            RecoveryGenerator::new().generate(&TransactionLog::default(), PathBuf::from("/p"), 1);
        assert!(recovery.plan.is_empty());
        assert!(recovery.unrecoverable.is_empty());
    }
}
