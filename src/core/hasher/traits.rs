//! Perceptual fingerprint types and the collaborator trait that produces them.

use crate::core::quality::Dimensions;
use crate::core::scanner::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fixed-width perceptual descriptor
///
/// Small edits to an image produce a small [`distance`](Fingerprint::distance).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// The raw fingerprint bytes
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Create a fingerprint from raw bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the raw fingerprint bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the total number of bits in this fingerprint
    pub fn bit_count(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Get the fingerprint as a hexadecimal string
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Hamming distance normalized to 0.0–1.0 (0 = identical)
    ///
    /// Returns `None` when the widths differ or the fingerprint is empty, as
    /// such values cannot be compared.
    pub fn distance(&self, other: &Self) -> Option<f64> {
        if self.bytes.len() != other.bytes.len() || self.bytes.is_empty() {
            return None;
        }

        let differing: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();

        Some(differing as f64 / self.bit_count() as f64)
    }
}

/// External capability that computes perceptual fingerprints
///
/// Only called for recognized media kinds. Returning `None` is a normal
/// outcome (unsupported codec, corrupt image, video without frame sampling).
pub trait PerceptualFingerprinter: Send + Sync {
    /// Fingerprint the file, if possible
    fn fingerprint(&self, path: &Path, kind: MediaKind) -> Option<Fingerprint>;

    /// Pixel dimensions of the file, if known
    fn dimensions(&self, _path: &Path, _kind: MediaKind) -> Option<Dimensions> {
        None
    }
}

/// Never produces a fingerprint; only exact duplicates will be found
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFingerprints;

impl PerceptualFingerprinter for NoFingerprints {
    fn fingerprint(&self, _path: &Path, _kind: MediaKind) -> Option<Fingerprint> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(bytes: &[u8]) -> Fingerprint {
        Fingerprint::new(bytes.to_vec())
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = fp(&[0xFF, 0x00, 0xAA, 0x55]);
        assert_eq!(a.distance(&a), Some(0.0));
    }

    #[test]
    fn distance_is_symmetric() {
        let a = fp(&[0xFF, 0x00]);
        let b = fp(&[0x0F, 0xFF]);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn distance_is_normalized() {
        let a = fp(&[0b1111_1111]);
        let b = fp(&[0b0000_0000]);
        assert_eq!(a.distance(&b), Some(1.0));

        let c = fp(&[0b0000_0011]);
        assert_eq!(b.distance(&c), Some(0.25));
    }

    #[test]
    fn mismatched_widths_are_incomparable() {
        let a = fp(&[0xFF]);
        let b = fp(&[0xFF, 0xFF]);
        assert_eq!(a.distance(&b), None);
        assert_eq!(fp(&[]).distance(&fp(&[])), None);
    }

    #[test]
    fn to_hex_produces_correct_string() {
        assert_eq!(fp(&[0xDE, 0xAD, 0xBE, 0xEF]).to_hex(), "deadbeef");
    }
}
