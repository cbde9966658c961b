//! # Quality Module
//!
//! Derives a comparable quality score for each file, used to choose which
//! copy of a duplicate group to keep.
//!
//! The weighting is pluggable through [`QualityModel`]. The default model
//! multiplies pixel count by file size when the resolution is known and
//! falls back to size alone otherwise. Whatever the model, the keeper
//! selector still breaks ties by size and then by path.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Comparable quality score (higher = better)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct QualityScore(pub u128);

/// Strategy for scoring a file's quality
pub trait QualityModel: Send + Sync {
    /// Score a file from its size and, when known, its resolution
    fn score(&self, size: u64, dimensions: Option<Dimensions>) -> QualityScore;
}

/// Resolution × size, or size alone when resolution is unknown
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionTimesSize;

impl QualityModel for ResolutionTimesSize {
    fn score(&self, size: u64, dimensions: Option<Dimensions>) -> QualityScore {
        match dimensions {
            Some(d) if d.pixels() > 0 => QualityScore(d.pixels() as u128 * size.max(1) as u128),
            _ => QualityScore(size as u128),
        }
    }
}

/// Ignores resolution entirely
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeOnly;

impl QualityModel for SizeOnly {
    fn score(&self, size: u64, _dimensions: Option<Dimensions>) -> QualityScore {
        QualityScore(size as u128)
    }
}
