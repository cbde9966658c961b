//! Default perceptual fingerprinter for still images.
//!
//! Uses the image_hasher crate with a DCT-preprocessed mean hash (the
//! classic pHash construction) at 8x8, giving a 64-bit fingerprint. Videos
//! are not fingerprinted.

use super::traits::{Fingerprint, PerceptualFingerprinter};
use crate::core::quality::Dimensions;
use crate::core::scanner::MediaKind;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use std::path::Path;

/// pHash-style fingerprints for still images
pub struct ImagePerceptualHasher {
    hasher: Hasher,
}

impl ImagePerceptualHasher {
    /// Create a hasher with the given side length (8 → 64 bits)
    pub fn new(hash_size: u32) -> Self {
        let hasher = HasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();

        Self { hasher }
    }
}

impl Default for ImagePerceptualHasher {
    fn default() -> Self {
        Self::new(8)
    }
}

impl PerceptualFingerprinter for ImagePerceptualHasher {
    fn fingerprint(&self, path: &Path, kind: MediaKind) -> Option<Fingerprint> {
        if kind != MediaKind::Image {
            return None;
        }

        match image::open(path) {
            Ok(image) => {
                let hash = self.hasher.hash_image(&image);
                Some(Fingerprint::new(hash.as_bytes().to_vec()))
            }
            Err(e) => {
                tracing::debug!("No fingerprint for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn dimensions(&self, path: &Path, kind: MediaKind) -> Option<Dimensions> {
        if kind != MediaKind::Image {
            return None;
        }

        image::image_dimensions(path)
            .ok()
            .map(|(width, height)| Dimensions::new(width, height))
    }
}
