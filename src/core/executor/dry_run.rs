//! Stand-in for the executor on dry runs.

use super::space::FreeSpace;
use super::{ExecutionReport, Executor};
use crate::core::context::{FailureCategory, RunContext};
use crate::core::planner::{OperationKind, Plan};
use crate::events::{Event, ExecuteEvent};

/// Reports what a plan would do without doing it
pub struct DryRunReporter<'a, S: FreeSpace> {
    executor: &'a Executor<S>,
}

impl<'a, S: FreeSpace> DryRunReporter<'a, S> {
    /// Borrow the executor's free-space source for the bulk-copy check
    pub fn new(executor: &'a Executor<S>) -> Self {
        Self { executor }
    }

    /// Describe every operation; nothing on disk or in the log changes
    pub fn report(&self, plan: &Plan, ctx: &mut RunContext) -> ExecutionReport {
        ctx.events.send(Event::Execute(ExecuteEvent::Started {
            total_operations: plan.len(),
            dry_run: true,
        }));

        if let Err(e) = self.executor.check_bulk_space(plan) {
            tracing::warn!("{} (the real run would stop here)", e);
            ctx.diagnostics
                .push(FailureCategory::SpaceInsufficient, &plan.root, e.to_string());
        }

        for operation in &plan.operations {
            match (operation.kind(), operation.destination()) {
                (OperationKind::Delete, _) | (_, None) => {
                    tracing::info!("Would delete {}", operation.source().display())
                }
                (kind, Some(destination)) => tracing::info!(
                    "Would {} {} -> {}",
                    kind,
                    operation.source().display(),
                    destination.display()
                ),
            }

            ctx.events.send(Event::Execute(ExecuteEvent::WouldApply {
                sequence: operation.sequence(),
                kind: operation.kind(),
                source: operation.source().to_path_buf(),
                destination: operation.destination().map(|d| d.to_path_buf()),
            }));
        }

        ctx.events.send(Event::Execute(ExecuteEvent::Completed {
            committed: 0,
            failed: 0,
            skipped: 0,
        }));

        ExecutionReport {
            operations: plan.operations.clone(),
            dry_run: true,
            ..ExecutionReport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::FixedFreeSpace;
    use crate::core::planner::{Operation, OperationStatus, RunKind};
    use crate::events::EventChannel;
    use tempfile::TempDir;

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.jpg");
        std::fs::write(&src, b"abc").unwrap();
        let dst = dir.path().join("2021").join("a.jpg");

        let mut plan = Plan::new(RunKind::Organize, dir.path().to_path_buf());
        plan.operations.push(Operation::move_file(1, src.clone(), dst.clone(), 3));

        let executor = Executor::new(FixedFreeSpace(u64::MAX));
        let (sender, receiver) = EventChannel::new();
        let mut ctx = RunContext::new(sender, Default::default());
        let report = DryRunReporter::new(&executor).report(&plan, &mut ctx);
        drop(ctx);

        assert!(src.exists());
        assert!(!dst.exists());
        assert!(report.dry_run);
        assert_eq!(report.operations[0].status(), OperationStatus::Planned);

        let would_apply = receiver
            .iter()
            .filter(|e| matches!(e, Event::Execute(ExecuteEvent::WouldApply { .. })))
            .count();
        assert_eq!(would_apply, 1);
    }

    #[test]
    fn dry_run_flags_space_shortfall_without_aborting() {
        let dir = TempDir::new().unwrap();
        let mut plan = Plan::new(RunKind::Flatten, dir.path().to_path_buf());
        plan.bulk_copy = true;
        plan.operations.push(Operation::copy_file(
            1,
            dir.path().join("a.jpg"),
            dir.path().join("flattened").join("a.jpg"),
            100,
        ));

        let executor = Executor::new(FixedFreeSpace(10));
        let mut ctx = RunContext::default();
        let report = DryRunReporter::new(&executor).report(&plan, &mut ctx);

        assert_eq!(report.operations.len(), 1);
        assert_eq!(ctx.diagnostics.count(FailureCategory::SpaceInsufficient), 1);
    }
}
