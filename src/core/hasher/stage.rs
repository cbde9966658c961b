//! The parallel hashing stage.
//!
//! Turns scanned files into [`FileRecord`]s on a bounded worker pool. Each
//! worker computes the content digest and, when asked, pulls the
//! perceptual fingerprint, dimensions and capture date from the supplied
//! collaborators. Results are gathered into a [`RecordSnapshot`] before any
//! later stage runs.

use super::content::ContentHash;
use super::traits::PerceptualFingerprinter;
use crate::core::metadata::CaptureDateProvider;
use crate::core::quality::QualityModel;
use crate::core::record::{FileRecord, RecordSnapshot};
use crate::core::scanner::ScannedFile;
use crate::error::HashError;
use crate::events::{Event, EventSender, FingerprintEvent, FingerprintProgress};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the stage should collect beyond the content digest
#[derive(Debug, Clone, Copy)]
pub struct FingerprintOptions {
    /// Worker pool size (at least 1)
    pub threads: usize,
    /// Request perceptual fingerprints for media files
    pub perceptual: bool,
    /// Request capture dates
    pub capture_dates: bool,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            perceptual: true,
            capture_dates: true,
        }
    }
}

/// Records that were built plus the files that could not be hashed
#[derive(Debug, Default)]
pub struct FingerprintOutcome {
    pub snapshot: RecordSnapshot,
    pub failures: Vec<HashError>,
}

/// Builds file records in parallel
pub struct Fingerprinter<'a, F, D, Q> {
    perceptual: &'a F,
    dates: &'a D,
    quality: &'a Q,
    options: FingerprintOptions,
}

impl<'a, F, D, Q> Fingerprinter<'a, F, D, Q>
where
    F: PerceptualFingerprinter,
    D: CaptureDateProvider,
    Q: QualityModel,
{
    pub fn new(perceptual: &'a F, dates: &'a D, quality: &'a Q, options: FingerprintOptions) -> Self {
        Self {
            perceptual,
            dates,
            quality,
            options,
        }
    }

    /// Hash every file, failing soft on individual files
    ///
    /// Only the worker pool failing to start is an error here.
    pub fn run(
        &self,
        files: &[ScannedFile],
        events: &EventSender,
    ) -> Result<FingerprintOutcome, HashError> {
        let total = files.len();
        events.send(Event::Fingerprint(FingerprintEvent::Started { total_files: total }));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads.max(1))
            .build()
            .map_err(|e| HashError::WorkerPool(e.to_string()))?;

        let completed = AtomicUsize::new(0);

        let results: Vec<Result<FileRecord, HashError>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = self.build_record(file);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    match &result {
                        Ok(_) => events.send(Event::Fingerprint(FingerprintEvent::Progress(
                            FingerprintProgress {
                                completed: done,
                                total,
                                current_path: file.path.clone(),
                            },
                        ))),
                        Err(e) => {
                            tracing::warn!("{}", e);
                            events.send(Event::Fingerprint(FingerprintEvent::Failed {
                                path: file.path.clone(),
                                message: e.to_string(),
                                completed: done,
                            }));
                        }
                    }

                    result
                })
                .collect()
        });

        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => failures.push(e),
            }
        }

        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            total_hashed: records.len(),
            failures: failures.len(),
        }));
        tracing::info!(
            "Hashed {} files ({} could not be hashed)",
            records.len(),
            failures.len()
        );

        Ok(FingerprintOutcome {
            snapshot: RecordSnapshot::new(records),
            failures,
        })
    }

    fn build_record(&self, file: &ScannedFile) -> Result<FileRecord, HashError> {
        let exact_hash = ContentHash::of_file(&file.path)?;

        let wants_media = self.options.perceptual && file.kind.is_media();
        let fingerprint = if wants_media {
            self.perceptual.fingerprint(&file.path, file.kind)
        } else {
            None
        };
        let dimensions = if wants_media {
            self.perceptual.dimensions(&file.path, file.kind)
        } else {
            None
        };
        let capture_date = if self.options.capture_dates {
            self.dates.capture_date(&file.path, file.kind)
        } else {
            None
        };

        tracing::debug!(
            "{} {} fingerprint={}",
            exact_hash,
            file.path.display(),
            fingerprint.is_some()
        );

        Ok(FileRecord {
            path: file.path.clone(),
            size: file.size,
            kind: file.kind,
            exact_hash,
            fingerprint,
            dimensions,
            capture_date,
            quality: self.quality.score(file.size, dimensions),
        })
    }
}
