//! Numeric interval scales.

use crate::error::{Result, SrmpError};
use std::cmp::Ordering;
use std::fmt;

/// Which end of a scale is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PreferenceDirection {
    /// Smaller values are better.
    Min,
    /// Larger values are better.
    #[default]
    Max,
}

/// A closed numeric interval `[dmin, dmax]` with a preference direction.
///
/// The normal scale `[0, 1]` with [`PreferenceDirection::Max`] is the
/// canonical working space of the learners.
///
/// # Examples
///
/// ```
/// use u_srmp::scale::{PreferenceDirection, QuantitativeScale};
///
/// let cost = QuantitativeScale::new(0.0, 200.0, PreferenceDirection::Min).unwrap();
/// assert!((cost.normalize(50.0).unwrap() - 0.75).abs() < 1e-12);
/// assert!((cost.denormalize(0.75).unwrap() - 50.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantitativeScale {
    pub dmin: f64,
    pub dmax: f64,
    pub direction: PreferenceDirection,
}

impl QuantitativeScale {
    /// Creates a scale over `[dmin, dmax]`; the interval must be non-empty.
    pub fn new(dmin: f64, dmax: f64, direction: PreferenceDirection) -> Result<Self> {
        if !dmin.is_finite() || !dmax.is_finite() || dmin >= dmax {
            return Err(SrmpError::InvalidScale(format!(
                "interval [{dmin}, {dmax}] must be finite with dmin < dmax"
            )));
        }
        Ok(Self {
            dmin,
            dmax,
            direction,
        })
    }

    /// The normal scale `[0, 1]`, MAX.
    pub fn normal() -> Self {
        Self {
            dmin: 0.0,
            dmax: 1.0,
            direction: PreferenceDirection::Max,
        }
    }

    pub fn is_normal(&self) -> bool {
        *self == Self::normal()
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.dmin && x <= self.dmax
    }

    fn check(&self, x: f64) -> Result<()> {
        if self.contains(x) {
            Ok(())
        } else {
            Err(SrmpError::OutOfScale {
                value: x.to_string(),
                scale: self.to_string(),
            })
        }
    }

    /// Maps `x` to `[0, 1]` so that larger always means better.
    pub fn normalize(&self, x: f64) -> Result<f64> {
        self.check(x)?;
        let r = (x - self.dmin) / (self.dmax - self.dmin);
        Ok(match self.direction {
            PreferenceDirection::Max => r,
            PreferenceDirection::Min => 1.0 - r,
        })
    }

    /// Inverse of [`normalize`](Self::normalize).
    pub fn denormalize(&self, y: f64) -> Result<f64> {
        QuantitativeScale::normal().check(y)?;
        let r = match self.direction {
            PreferenceDirection::Max => y,
            PreferenceDirection::Min => 1.0 - y,
        };
        Ok(self.dmin + r * (self.dmax - self.dmin))
    }

    /// Orders two values by preference: `Greater` means `x` is better.
    pub fn compare(&self, x: f64, y: f64) -> Result<Ordering> {
        self.check(x)?;
        self.check(y)?;
        let raw = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        Ok(match self.direction {
            PreferenceDirection::Max => raw,
            PreferenceDirection::Min => raw.reverse(),
        })
    }
}

impl fmt::Display for QuantitativeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PreferenceDirection::Max => "max",
            PreferenceDirection::Min => "min",
        };
        write!(f, "quantitative[{}, {}]({dir})", self.dmin, self.dmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_interval() {
        assert!(QuantitativeScale::new(1.0, 1.0, PreferenceDirection::Max).is_err());
        assert!(QuantitativeScale::new(2.0, 1.0, PreferenceDirection::Max).is_err());
        assert!(QuantitativeScale::new(f64::NAN, 1.0, PreferenceDirection::Max).is_err());
    }

    #[test]
    fn test_normalize_max() {
        let s = QuantitativeScale::new(10.0, 20.0, PreferenceDirection::Max).unwrap();
        assert!((s.normalize(15.0).unwrap() - 0.5).abs() < 1e-12);
        assert!((s.normalize(20.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_min_inverts() {
        let s = QuantitativeScale::new(0.0, 10.0, PreferenceDirection::Min).unwrap();
        assert!((s.normalize(0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((s.normalize(10.0).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_scale() {
        let s = QuantitativeScale::normal();
        assert!(matches!(
            s.normalize(1.5),
            Err(SrmpError::OutOfScale { .. })
        ));
        assert!(s.denormalize(-0.1).is_err());
        assert!(!s.contains(f64::NAN));
    }

    #[test]
    fn test_round_trip() {
        let s = QuantitativeScale::new(-5.0, 5.0, PreferenceDirection::Min).unwrap();
        for x in [-5.0, -1.25, 0.0, 3.5, 5.0] {
            let back = s.denormalize(s.normalize(x).unwrap()).unwrap();
            assert!((back - x).abs() < 1e-12);
        }
    }

    #[test]
    fn test_compare_respects_direction() {
        let max = QuantitativeScale::normal();
        let min = QuantitativeScale::new(0.0, 1.0, PreferenceDirection::Min).unwrap();
        assert_eq!(max.compare(0.7, 0.2).unwrap(), Ordering::Greater);
        assert_eq!(min.compare(0.7, 0.2).unwrap(), Ordering::Less);
        assert_eq!(min.compare(0.3, 0.3).unwrap(), Ordering::Equal);
    }
}
