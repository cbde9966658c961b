//! Undoing a logged run.

use super::report::{next_sequence_in, recovery_log_path, summarize, RunReport};
use crate::core::context::{CancellationToken, RunContext};
use crate::core::executor::{DryRunReporter, Executor, FreeSpace, SystemFreeSpace};
use crate::core::journal::{TransactionLog, TransactionLogWriter};
use crate::core::planner::RunKind;
use crate::core::recovery::RecoveryGenerator;
use crate::error::SnapTidyError;
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelinePhase};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Replays a transaction log backwards
///
/// The undo steps go through the same executor as a forward run and are
/// logged to `snaptidy_recovery_log.csv` next to the replayed log.
pub struct Recovery<S = SystemFreeSpace> {
    log_path: PathBuf,
    recovery_log: Option<PathBuf>,
    dry_run: bool,
    space: S,
}

impl Recovery {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            recovery_log: None,
            dry_run: false,
            space: SystemFreeSpace,
        }
    }
}

impl<S: FreeSpace> Recovery<S> {
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write the recovery run's own log somewhere else
    pub fn recovery_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.recovery_log = Some(path.into());
        self
    }

    /// Swap the free-space collaborator
    pub fn free_space<S2: FreeSpace>(self, space: S2) -> Recovery<S2> {
        Recovery {
            log_path: self.log_path,
            recovery_log: self.recovery_log,
            dry_run: self.dry_run,
            space,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn run(&self) -> Result<RunReport, SnapTidyError> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunReport, SnapTidyError> {
        events.send(Event::Pipeline(PipelineEvent::Started));
        let result = self.replay(events, cancel);
        if let Err(e) = &result {
            tracing::error!("{}", e);
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn replay(&self, events: &EventSender, cancel: &CancellationToken) -> Result<RunReport, SnapTidyError> {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Recovering,
        }));

        let log = TransactionLog::read(&self.log_path)?;
        if log.skipped_rows() > 0 {
            tracing::warn!(
                "Ignored {} incomplete rows in {}",
                log.skipped_rows(),
                self.log_path.display()
            );
        }

        let root = match self.log_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let recovery_log = self
            .recovery_log
            .clone()
            .unwrap_or_else(|| recovery_log_path(&self.log_path));

        let recovery = RecoveryGenerator::new().generate(&log, root.clone(), next_sequence_in(&recovery_log)?);
        let plan = recovery.plan;
        events.send(Event::Pipeline(PipelineEvent::PlanReady {
            operations: plan.len(),
            total_bytes: plan.total_bytes(),
        }));

        let mut ctx = RunContext::new(events.clone(), cancel.clone());
        let executor = Executor::new(&self.space);
        let execution = if self.dry_run {
            DryRunReporter::new(&executor).report(&plan, &mut ctx)
        } else {
            if !plan.is_empty() {
                ctx.journal = Some(TransactionLogWriter::open(&recovery_log)?);
            }
            executor.execute(&plan, &mut ctx)?
        };

        if execution.cancelled {
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        }

        let mut summary = summarize(0, 0, &[], &plan, &execution, &ctx.diagnostics);
        summary.unrecoverable = recovery.unrecoverable.len();

        let wrote_log = !self.dry_run && !plan.is_empty();
        let report = RunReport {
            run_id: uuid::Uuid::new_v4(),
            run: RunKind::Recovery,
            root,
            plan,
            groups: Vec::new(),
            execution,
            diagnostics: ctx.diagnostics,
            unrecoverable: recovery.unrecoverable,
            summary,
            log_path: wrote_log.then_some(recovery_log),
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        report.log_outcome();
        if report.summary.unrecoverable > 0 {
            tracing::warn!(
                "{} deletions in the log cannot be undone",
                report.summary.unrecoverable
            );
        }
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: report.pipeline_summary(),
        }));

        Ok(report)
    }
}
