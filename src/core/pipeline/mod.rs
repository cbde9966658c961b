//! # Pipeline Module
//!
//! Orchestrates a full run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Walk the root once, skipping the folders the plan writes
//!    into and every snaptidy log
//! 2. **Fingerprint** - Hash every file in parallel (perceptual
//!    fingerprints for dedup, capture dates for organize)
//! 3. **Cluster** - Group duplicates and pick keepers (dedup only)
//! 4. **Plan** - Build the ordered operation list
//! 5. **Execute** - Apply it, or report it on a dry run
//!
//! [`Recovery`] runs a logged plan backwards through the same executor.
//!
//! ## Parallelism
//! Only fingerprinting is parallel. Every later stage works on one
//! immutable snapshot and operations are applied one at a time.

mod builder;
mod recover;
mod report;
mod run;

pub use builder::{PipelineBuilder, PipelineConfig};
pub use recover::Recovery;
pub use report::RunReport;
pub use run::Pipeline;
