//! # Hasher Module
//!
//! Computes what the clusterer compares.
//!
//! ## Two kinds of hash
//! - **Content hash** - BLAKE3 over the whole file. Equal digests mean
//!   byte-identical files. Computed for every file.
//! - **Perceptual fingerprint** - a fixed-width descriptor where small
//!   visual edits give a small Hamming distance. Provided by a
//!   [`PerceptualFingerprinter`] collaborator, only for images and videos.
//!
//! ## Parallelism
//! [`Fingerprinter`] is the only parallel stage of a run. It uses a rayon
//! pool sized to the configured thread count and collects everything into
//! an immutable snapshot before clustering starts.
//!
//! ## Example
//! ```rust,ignore
//! use snaptidy::core::hasher::{Fingerprinter, FingerprintOptions, ImagePerceptualHasher};
//!
//! let stage = Fingerprinter::new(&ImagePerceptualHasher::default(), &ExifDateProvider, &ResolutionTimesSize, FingerprintOptions::default());
//! let outcome = stage.run(&scan.files, &null_sender())?;
//! ```

mod content;
mod perceptual;
mod stage;
mod traits;

pub use content::ContentHash;
pub use perceptual::ImagePerceptualHasher;
pub use stage::{FingerprintOptions, FingerprintOutcome, Fingerprinter};
pub use traits::{Fingerprint, NoFingerprints, PerceptualFingerprinter};
