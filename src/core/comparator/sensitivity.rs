//! Similarity threshold for soft grouping.

use crate::error::SnapTidyError;
use serde::{Deserialize, Serialize};

/// Slack for float error in the threshold comparison
const DISTANCE_EPSILON: f64 = 1e-9;

/// User-facing similarity threshold in `[0, 1]`
///
/// Two fingerprints are similar when their normalized distance is at most
/// `1 - sensitivity`, so lowering the value widens the groups.
///
/// | Sensitivity | Max distance | 64-bit fingerprint |
/// |-------------|--------------|--------------------|
/// | 1.0         | 0.0          | identical only     |
/// | 0.9         | 0.1          | 6 bits             |
/// | 0.0         | 1.0          | everything matches |
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Sensitivity(f64);

impl Sensitivity {
    /// Sensitivity used when none is configured
    pub const DEFAULT: f64 = 0.9;

    /// Validate and wrap a raw value
    pub fn new(value: f64) -> Result<Self, SnapTidyError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SnapTidyError::Config(format!(
                "sensitivity must be between 0 and 1, got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Largest normalized distance still considered similar
    pub fn max_distance(&self) -> f64 {
        1.0 - self.0
    }

    /// Whether a distance falls within the threshold
    pub fn accepts(&self, distance: f64) -> bool {
        distance <= self.max_distance() + DISTANCE_EPSILON
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Sensitivity::new(-0.1).is_err());
        assert!(Sensitivity::new(1.5).is_err());
        assert!(Sensitivity::new(f64::NAN).is_err());
        assert!(Sensitivity::new(0.0).is_ok());
        assert!(Sensitivity::new(1.0).is_ok());
    }

    #[test]
    fn default_is_point_nine() {
        assert_eq!(Sensitivity::default().value(), 0.9);
    }

    #[test]
    fn threshold_is_inclusive() {
        let s = Sensitivity::new(0.75).unwrap();
        assert!(s.accepts(0.25));
        assert!(!s.accepts(0.26));
    }

    #[test]
    fn full_sensitivity_only_accepts_identical() {
        let s = Sensitivity::new(1.0).unwrap();
        assert!(s.accepts(0.0));
        assert!(!s.accepts(1.0 / 64.0));
    }

    #[test]
    fn zero_sensitivity_accepts_everything() {
        assert!(Sensitivity::new(0.0).unwrap().accepts(1.0));
    }
}
