//! Pipeline execution.

use super::builder::{PipelineBuilder, PipelineConfig};
use super::report::{next_sequence_in, normalize_log_path, summarize, RunReport};
use crate::core::comparator::{Clusterer, Sensitivity};
use crate::core::context::{CancellationToken, FailureCategory, RunContext};
use crate::core::executor::{
    remove_empty_dirs, DryRunReporter, Executor, FreeSpace, SystemFreeSpace,
};
use crate::core::hasher::{
    FingerprintOptions, Fingerprinter, ImagePerceptualHasher, PerceptualFingerprinter,
};
use crate::core::journal::TransactionLogWriter;
use crate::core::keeper::{DuplicateGroup, KeeperSelector};
use crate::core::metadata::{CaptureDateProvider, ExifDateProvider};
use crate::core::planner::{PlanMode, Planner, PlannerConfig, RunKind, Transfer};
use crate::core::quality::{QualityModel, ResolutionTimesSize};
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::error::{HashError, ScanError, SnapTidyError};
use crate::events::{
    null_sender, ClusterEvent, Event, EventSender, PipelineEvent, PipelinePhase,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The scan → fingerprint → cluster → plan → execute pipeline
pub struct Pipeline<
    F = ImagePerceptualHasher,
    D = ExifDateProvider,
    S = SystemFreeSpace,
    Q = ResolutionTimesSize,
> {
    pub(super) config: PipelineConfig,
    pub(super) scanner: Option<Box<dyn FileScanner>>,
    pub(super) sensitivity: Sensitivity,
    pub(super) fingerprinter: F,
    pub(super) dates: D,
    pub(super) space: S,
    pub(super) quality: Q,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(root: impl Into<PathBuf>, mode: PlanMode) -> PipelineBuilder {
        PipelineBuilder::new(root, mode)
    }
}

impl<F, D, S, Q> Pipeline<F, D, S, Q>
where
    F: PerceptualFingerprinter,
    D: CaptureDateProvider,
    S: FreeSpace,
    Q: QualityModel,
{
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<RunReport, SnapTidyError> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Run the pipeline with event reporting and cancellation
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunReport, SnapTidyError> {
        events.send(Event::Pipeline(PipelineEvent::Started));
        let result = self.execute_phases(events, cancel);
        if let Err(e) = &result {
            tracing::error!("{}", e);
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute_phases(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunReport, SnapTidyError> {
        let start_time = Instant::now();
        let run = self.config.mode.run_kind();
        let root = canonical_root(&self.config.root)?;
        let mut ctx = RunContext::new(events.clone(), cancel.clone());

        let log_path = self.config.logging.then(|| {
            normalize_log_path(
                self.config
                    .log_path
                    .clone()
                    .unwrap_or_else(|| root.join(run.log_file_name())),
            )
        });

        let first_sequence = match &log_path {
            Some(path) => next_sequence_in(path)?,
            None => 1,
        };
        let planner = Planner::new(
            root.clone(),
            PlannerConfig::new(self.config.mode.clone())
                .safe_mode(self.config.logging)
                .first_sequence(first_sequence),
        );

        tracing::info!(
            "Starting {} of {}{}",
            run,
            root.display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scan_result = match &self.scanner {
            Some(scanner) => scanner.scan_with_events(&root, events)?,
            None => WalkDirScanner::new(self.scan_config(&root, &planner, log_path.as_deref()))
                .scan_with_events(&root, events)?,
        };
        for warning in &scan_result.warnings {
            ctx.diagnostics
                .push(FailureCategory::ScanWarning, warning.path(), warning.to_string());
        }
        let files_scanned = scan_result.files.len();

        // Phase 2: Fingerprinting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Fingerprinting,
        }));

        let options = FingerprintOptions {
            threads: self.config.threads,
            perceptual: self.config.mode.needs_groups(),
            capture_dates: self.config.mode.needs_capture_dates(),
        };
        let outcome = Fingerprinter::new(&self.fingerprinter, &self.dates, &self.quality, options)
            .run(&scan_result.files, events)?;
        for failure in &outcome.failures {
            let path = match failure {
                HashError::Io { path, .. } => path.as_path(),
                HashError::WorkerPool(_) => root.as_path(),
            };
            ctx.diagnostics
                .push(FailureCategory::HashFailure, path, failure.to_string());
        }
        let snapshot = outcome.snapshot;

        // Phase 3: Clustering (dedup only)
        let groups: Vec<DuplicateGroup> = if self.config.mode.needs_groups() {
            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Clustering,
            }));
            let clusters = Clusterer::new(self.sensitivity).cluster(&snapshot);
            let groups = KeeperSelector::new().select_all(clusters);
            events.send(Event::Cluster(ClusterEvent::Completed {
                total_groups: groups.len(),
                duplicate_files: groups.iter().map(|g| g.duplicate_count()).sum(),
                reclaimable_bytes: groups.iter().map(|g| g.reclaimable_bytes()).sum(),
            }));
            groups
        } else {
            Vec::new()
        };

        // Phase 4: Planning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Planning,
        }));
        let plan = planner.plan(&snapshot, &groups)?;
        events.send(Event::Pipeline(PipelineEvent::PlanReady {
            operations: plan.len(),
            total_bytes: plan.total_bytes(),
        }));

        // Phase 5: Executing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Executing,
        }));
        let executor = Executor::new(&self.space);
        let execution = if self.config.dry_run {
            DryRunReporter::new(&executor).report(&plan, &mut ctx)
        } else {
            // A bulk copy that cannot fit must not leave a log behind
            executor.check_bulk_space(&plan)?;
            if let (Some(path), false) = (&log_path, plan.is_empty()) {
                ctx.journal = Some(TransactionLogWriter::open(path)?);
            }
            executor.execute(&plan, &mut ctx)?
        };

        let flattened_by_move = matches!(
            self.config.mode,
            PlanMode::Flatten {
                transfer: Transfer::Move,
                ..
            }
        );
        if flattened_by_move && !self.config.dry_run && execution.committed > 0 {
            let removed = remove_empty_dirs(&root);
            tracing::info!("Removed {} empty directories", removed);
        }

        if execution.cancelled {
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        }

        let summary = summarize(
            files_scanned,
            snapshot.len(),
            &groups,
            &plan,
            &execution,
            &ctx.diagnostics,
        );
        let report = RunReport {
            run_id: uuid::Uuid::new_v4(),
            run,
            root,
            plan,
            groups,
            execution,
            diagnostics: ctx.diagnostics,
            unrecoverable: Vec::new(),
            summary,
            log_path,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        report.log_outcome();
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: report.pipeline_summary(),
        }));

        Ok(report)
    }

    /// Exclude the folders the plan writes into and every snaptidy log
    fn scan_config(&self, root: &Path, planner: &Planner, log_path: Option<&Path>) -> ScanConfig {
        let mut config = self.config.scan_config.clone();
        config.excluded.extend(planner.managed_folders());
        config
            .excluded
            .extend(RunKind::ALL.iter().map(|kind| root.join(kind.log_file_name())));
        if let Some(path) = log_path {
            config.excluded.push(path.to_path_buf());
        }
        config
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::canonicalize(root).map_err(|source| ScanError::ReadEntry {
        path: root.to_path_buf(),
        source,
    })
}
