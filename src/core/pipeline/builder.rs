//! Pipeline configuration and builder.

use super::run::Pipeline;
use crate::core::comparator::Sensitivity;
use crate::core::executor::{FreeSpace, SystemFreeSpace};
use crate::core::hasher::{ImagePerceptualHasher, PerceptualFingerprinter};
use crate::core::metadata::{CaptureDateProvider, ExifDateProvider};
use crate::core::planner::PlanMode;
use crate::core::quality::{QualityModel, ResolutionTimesSize};
use crate::core::scanner::{FileScanner, ScanConfig};
use crate::error::SnapTidyError;
use std::path::PathBuf;

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory to tidy
    pub root: PathBuf,
    /// What the run does
    pub mode: PlanMode,
    /// Similarity threshold for dedup (0.0 - 1.0)
    pub sensitivity: f64,
    /// Hashing worker pool size
    pub threads: usize,
    /// Preview only
    pub dry_run: bool,
    /// Keep a transaction log and never delete
    pub logging: bool,
    /// Where the transaction log goes; `<root>/snaptidy_<mode>_log.csv`
    /// when absent
    pub log_path: Option<PathBuf>,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl PipelineConfig {
    pub fn new(root: impl Into<PathBuf>, mode: PlanMode) -> Self {
        Self {
            root: root.into(),
            mode,
            sensitivity: Sensitivity::DEFAULT,
            threads: default_threads(),
            dry_run: false,
            logging: false,
            log_path: None,
            scan_config: ScanConfig::default(),
        }
    }
}

pub(crate) fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Builder for [`Pipeline`]
///
/// The collaborators default to the bundled implementations and can be
/// swapped for anything implementing the matching trait.
pub struct PipelineBuilder<
    F = ImagePerceptualHasher,
    D = ExifDateProvider,
    S = SystemFreeSpace,
    Q = ResolutionTimesSize,
> {
    config: PipelineConfig,
    scanner: Option<Box<dyn FileScanner>>,
    fingerprinter: F,
    dates: D,
    space: S,
    quality: Q,
}

impl PipelineBuilder {
    /// Create a builder with the default collaborators
    pub fn new(root: impl Into<PathBuf>, mode: PlanMode) -> Self {
        Self {
            config: PipelineConfig::new(root, mode),
            scanner: None,
            fingerprinter: ImagePerceptualHasher::default(),
            dates: ExifDateProvider,
            space: SystemFreeSpace,
            quality: ResolutionTimesSize,
        }
    }
}

impl<F, D, S, Q> PipelineBuilder<F, D, S, Q>
where
    F: PerceptualFingerprinter,
    D: CaptureDateProvider,
    S: FreeSpace,
    Q: QualityModel,
{
    /// Set the dedup similarity threshold
    pub fn sensitivity(mut self, sensitivity: f64) -> Self {
        self.config.sensitivity = sensitivity;
        self
    }

    /// Set the hashing worker pool size
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Enable the transaction log and safe mode
    pub fn logging(mut self, logging: bool) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = Some(path.into());
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Replace the walkdir scanner
    ///
    /// The replacement is handed the root as is; `scan_config` and the
    /// folders the plan writes into are not applied to it.
    pub fn scanner(mut self, scanner: Box<dyn FileScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Swap the perceptual fingerprint collaborator
    pub fn fingerprinter<F2: PerceptualFingerprinter>(self, fingerprinter: F2) -> PipelineBuilder<F2, D, S, Q> {
        PipelineBuilder {
            config: self.config,
            scanner: self.scanner,
            fingerprinter,
            dates: self.dates,
            space: self.space,
            quality: self.quality,
        }
    }

    /// Swap the capture-date collaborator
    pub fn capture_dates<D2: CaptureDateProvider>(self, dates: D2) -> PipelineBuilder<F, D2, S, Q> {
        PipelineBuilder {
            config: self.config,
            scanner: self.scanner,
            fingerprinter: self.fingerprinter,
            dates,
            space: self.space,
            quality: self.quality,
        }
    }

    /// Swap the free-space collaborator
    pub fn free_space<S2: FreeSpace>(self, space: S2) -> PipelineBuilder<F, D, S2, Q> {
        PipelineBuilder {
            config: self.config,
            scanner: self.scanner,
            fingerprinter: self.fingerprinter,
            dates: self.dates,
            space,
            quality: self.quality,
        }
    }

    /// Swap the quality model used to pick keepers
    pub fn quality<Q2: QualityModel>(self, quality: Q2) -> PipelineBuilder<F, D, S, Q2> {
        PipelineBuilder {
            config: self.config,
            scanner: self.scanner,
            fingerprinter: self.fingerprinter,
            dates: self.dates,
            space: self.space,
            quality,
        }
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline<F, D, S, Q>, SnapTidyError> {
        let sensitivity = Sensitivity::new(self.config.sensitivity)?;
        if self.config.threads == 0 {
            return Err(SnapTidyError::Config(
                "thread count must be at least 1".to_string(),
            ));
        }

        Ok(Pipeline {
            config: self.config,
            scanner: self.scanner,
            sensitivity,
            fingerprinter: self.fingerprinter,
            dates: self.dates,
            space: self.space,
            quality: self.quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planner::DateLayout;

    fn organize() -> PlanMode {
        PlanMode::Organize {
            layout: DateLayout::Year,
            unclassified_folder: None,
        }
    }

    #[test]
    fn defaults_are_sensible() {
        let config = PipelineConfig::new("/photos", organize());
        assert_eq!(config.sensitivity, 0.9);
        assert!(config.threads >= 1);
        assert!(!config.dry_run);
        assert!(!config.logging);
        assert!(config.log_path.is_none());
    }

    #[test]
    fn rejects_sensitivity_out_of_range() {
        let result = PipelineBuilder::new("/photos", organize()).sensitivity(1.5).build();
        assert!(matches!(result, Err(SnapTidyError::Config(_))));
    }

    #[test]
    fn rejects_zero_threads() {
        let result = PipelineBuilder::new("/photos", organize()).threads(0).build();
        assert!(matches!(result, Err(SnapTidyError::Config(_))));
    }

    #[test]
    fn builder_chains_settings() {
        let pipeline = PipelineBuilder::new("/photos", organize())
            .threads(2)
            .dry_run(true)
            .logging(true)
            .log_path("/tmp/log.csv")
            .build()
            .unwrap();

        assert_eq!(pipeline.config().threads, 2);
        assert!(pipeline.config().dry_run);
        assert_eq!(pipeline.config().log_path, Some(PathBuf::from("/tmp/log.csv")));
    }
}
