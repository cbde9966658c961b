//! # Executor Module
//!
//! Applies a plan one operation at a time, in sequence order.
//!
//! ## Per-operation state machine
//! ```text
//! Planned ──ok──▶ Committed
//!    │
//!    └──error──▶ Failed (run continues)
//! ```
//!
//! Each operation is logged as `planned` before any filesystem call and
//! as `committed` or `failed` afterwards. Cancellation is only checked
//! between operations. A bulk copy whose total size exceeds the free space
//! at the target is refused before anything is touched.
//!
//! [`DryRunReporter`] stands in for the executor on dry runs: it reports
//! what would happen and never touches the filesystem or the log.

mod apply;
mod dry_run;
mod guard;
mod space;

pub use apply::remove_empty_dirs;
pub use dry_run::DryRunReporter;
pub use space::{FixedFreeSpace, FreeSpace, SystemFreeSpace};

use crate::core::context::{FailureCategory, RunContext};
use crate::core::planner::{Operation, OperationKind, OperationStatus, Plan};
use crate::error::ExecuteError;
use crate::events::{Event, ExecuteEvent};
use guard::OperationGuard;
use serde::{Deserialize, Serialize};

/// What happened to every operation of a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Operations that were attempted, with their final status
    pub operations: Vec<Operation>,
    pub committed: usize,
    pub failed: usize,
    /// Operations never attempted because of cancellation
    pub skipped: usize,
    pub cancelled: bool,
    pub dry_run: bool,
    pub bytes_moved: u64,
    pub bytes_copied: u64,
    pub bytes_deleted: u64,
}

impl ExecutionReport {
    fn record(&mut self, operation: Operation) {
        match operation.status() {
            OperationStatus::Committed => {
                self.committed += 1;
                match operation.kind() {
                    OperationKind::Move => self.bytes_moved += operation.expected_size(),
                    OperationKind::Copy => self.bytes_copied += operation.expected_size(),
                    OperationKind::Delete => self.bytes_deleted += operation.expected_size(),
                }
            }
            OperationStatus::Failed => self.failed += 1,
            OperationStatus::Planned => {}
        }
        self.operations.push(operation);
    }
}

/// Applies plans to the filesystem
pub struct Executor<S: FreeSpace> {
    space: S,
}

impl<S: FreeSpace> Executor<S> {
    pub fn new(space: S) -> Self {
        Self { space }
    }

    /// Refuse a bulk copy that cannot fit
    pub fn check_bulk_space(&self, plan: &Plan) -> Result<(), ExecuteError> {
        if !plan.bulk_copy {
            return Ok(());
        }
        let Some(target) = plan
            .operations
            .iter()
            .find(|op| op.kind() == OperationKind::Copy)
            .and_then(|op| op.destination())
            .and_then(|d| d.parent())
        else {
            return Ok(());
        };

        let required = plan.copy_bytes();
        let available = self.space.free_bytes(target);
        if required > available {
            return Err(ExecuteError::SpaceInsufficient {
                path: target.to_path_buf(),
                required,
                available,
            });
        }
        Ok(())
    }

    /// Apply every operation of the plan
    ///
    /// Returns `Err` only for whole-run problems: a bulk copy that cannot
    /// fit, or a log that cannot be written. Individual failures are
    /// recorded in the report and the context's diagnostics.
    pub fn execute(&self, plan: &Plan, ctx: &mut RunContext) -> Result<ExecutionReport, ExecuteError> {
        ctx.events.send(Event::Execute(ExecuteEvent::Started {
            total_operations: plan.len(),
            dry_run: false,
        }));

        if let Err(e) = self.check_bulk_space(plan) {
            tracing::error!("{}", e);
            ctx.diagnostics
                .push(FailureCategory::SpaceInsufficient, &plan.root, e.to_string());
            return Err(e);
        }

        let mut report = ExecutionReport::default();

        for (index, operation) in plan.operations.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                report.cancelled = true;
                report.skipped = plan.len() - index;
                tracing::warn!("Cancelled, {} operations not attempted", report.skipped);
                break;
            }

            ctx.events.send(Event::Execute(ExecuteEvent::OperationStarted {
                sequence: operation.sequence(),
                kind: operation.kind(),
                source: operation.source().to_path_buf(),
            }));

            let guard = OperationGuard::begin(ctx.journal.as_mut(), operation.clone())?;
            let outcome = if plan.is_recovery() {
                apply::verify_content(guard.operation())
                    .and_then(|()| apply::apply(guard.operation(), &self.space))
            } else {
                apply::apply(guard.operation(), &self.space)
            };

            let (status, message) = match outcome {
                Ok(()) => {
                    tracing::info!("{}", operation);
                    (OperationStatus::Committed, None)
                }
                Err(e) => {
                    let category = categorize(&e, plan.is_recovery());
                    match category {
                        FailureCategory::RecoveryInconsistency => {
                            tracing::warn!("Skipping undo step #{}: {}", operation.sequence(), e)
                        }
                        _ => tracing::error!("Operation #{} failed: {}", operation.sequence(), e),
                    }
                    ctx.diagnostics.push(category, operation.source(), e.to_string());
                    (OperationStatus::Failed, Some(e.to_string()))
                }
            };

            let finished = guard.finish(status)?;
            ctx.events.send(Event::Execute(ExecuteEvent::OperationFinished {
                sequence: finished.sequence(),
                status,
                message,
            }));
            report.record(finished);
        }

        ctx.events.send(Event::Execute(ExecuteEvent::Completed {
            committed: report.committed,
            failed: report.failed,
            skipped: report.skipped,
        }));

        Ok(report)
    }
}

impl Default for Executor<SystemFreeSpace> {
    fn default() -> Self {
        Self::new(SystemFreeSpace)
    }
}

fn categorize(error: &ExecuteError, recovery: bool) -> FailureCategory {
    match error {
        ExecuteError::SpaceInsufficient { .. } => FailureCategory::SpaceInsufficient,
        ExecuteError::SourceMissing { .. }
        | ExecuteError::SourceChanged { .. }
        | ExecuteError::ContentChanged { .. }
        | ExecuteError::DestinationExists { .. }
            if recovery =>
        {
            FailureCategory::RecoveryInconsistency
        }
        _ => FailureCategory::OperationFailure,
    }
}
