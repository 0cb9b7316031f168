//! Criteria importance: additive weights (SRMP) or capacities (RMP).
//!
//! The ranking rule only ever asks one question of the importance model:
//! "what is this coalition worth?". [`CoalitionValue`] is that question.

use super::capacity::PowerSet;
use crate::error::{Result, SrmpError};
use std::fmt;

/// Most criteria a coalition bitset can hold.
pub const MAX_CRITERIA: usize = 64;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A subset of criteria stored as a bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coalition(pub u64);

impl Coalition {
    pub const EMPTY: Coalition = Coalition(0);

    /// The full set `{0, .., n-1}`.
    pub fn full(n: usize) -> Self {
        if n >= MAX_CRITERIA {
            Coalition(u64::MAX)
        } else {
            Coalition((1u64 << n) - 1)
        }
    }

    pub fn from_criteria<I: IntoIterator<Item = usize>>(criteria: I) -> Self {
        Coalition(criteria.into_iter().fold(0, |bits, j| bits | (1 << j)))
    }

    pub fn contains(self, criterion: usize) -> bool {
        self.0 & (1 << criterion) != 0
    }

    pub fn with(self, criterion: usize) -> Self {
        Coalition(self.0 | (1 << criterion))
    }

    pub fn without(self, criterion: usize) -> Self {
        Coalition(self.0 & !(1 << criterion))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_CRITERIA).filter(move |&j| self.contains(j))
    }
}

impl fmt::Display for Coalition {
    /// Set-literal form: `{0, 2}`, or `set()` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("set()");
        }
        let items: Vec<String> = self.iter().map(|j| j.to_string()).collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}

/// Maps a coalition of criteria to a scalar strength.
pub trait CoalitionValue {
    /// Number of criteria the model is defined on.
    fn n_criteria(&self) -> usize;

    /// Strength of `coalition`. Monotone with respect to inclusion.
    fn coalition_value(&self, coalition: Coalition) -> f64;
}

/// Non-negative criteria weights summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights(Vec<f64>);

impl Weights {
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() || weights.len() > MAX_CRITERIA {
            return Err(SrmpError::InvalidModel(format!(
                "expected 1..={MAX_CRITERIA} weights, got {}",
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SrmpError::InvalidModel(format!("weight {w} is non-finite or negative")));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SrmpError::InvalidModel(format!(
                "weights sum to {sum}, expected 1"
            )));
        }
        Ok(Self(weights))
    }

    /// Rescales non-negative raw weights so that they sum to 1.
    pub fn normalized(raw: Vec<f64>) -> Result<Self> {
        let sum: f64 = raw.iter().sum();
        if !(sum > 0.0) {
            return Err(SrmpError::InvalidModel(
                "raw weights must have a positive sum".into(),
            ));
        }
        Self::new(raw.into_iter().map(|w| w / sum).collect())
    }

    pub fn uniform(n: usize) -> Result<Self> {
        Self::new(vec![1.0 / n as f64; n])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.0
    }
}

impl CoalitionValue for Weights {
    fn n_criteria(&self) -> usize {
        self.0.len()
    }

    fn coalition_value(&self, coalition: Coalition) -> f64 {
        coalition.iter().take_while(|&j| j < self.0.len()).map(|j| self.0[j]).sum()
    }
}

/// Importance model of an SRMP (weights) or RMP (capacities) model.
#[derive(Debug, Clone, PartialEq)]
pub enum Importance {
    Weights(Weights),
    Capacities(PowerSet),
}

impl CoalitionValue for Importance {
    fn n_criteria(&self) -> usize {
        match self {
            Importance::Weights(w) => w.n_criteria(),
            Importance::Capacities(c) => c.n_criteria(),
        }
    }

    fn coalition_value(&self, coalition: Coalition) -> f64 {
        match self {
            Importance::Weights(w) => w.coalition_value(coalition),
            Importance::Capacities(c) => c.coalition_value(coalition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalition_ops() {
        let c = Coalition::from_criteria([0, 2]);
        assert!(c.contains(0) && !c.contains(1) && c.contains(2));
        assert_eq!(c.len(), 2);
        assert_eq!(c.with(1), Coalition::full(3));
        assert_eq!(c.without(0), Coalition::from_criteria([2]));
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_coalition_display() {
        assert_eq!(Coalition::EMPTY.to_string(), "set()");
        assert_eq!(Coalition::from_criteria([1, 3]).to_string(), "{1, 3}");
    }

    #[test]
    fn test_weights_validation() {
        assert!(Weights::new(vec![0.5, 0.5]).is_ok());
        assert!(Weights::new(vec![0.5, 0.6]).is_err());
        assert!(Weights::new(vec![1.5, -0.5]).is_err());
        assert!(Weights::new(vec![]).is_err());
        assert!(Weights::normalized(vec![0.0, 0.0]).is_err());
        let w = Weights::normalized(vec![1.0, 3.0]).unwrap();
        assert!((w.as_slice()[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_weight_message() {
        let err = Weights::new(vec![f64::NAN, 1.0]).unwrap_err();
        assert!(err.to_string().contains("non-finite or negative"), "{err}");
        let err = Weights::new(vec![1.5, -0.5]).unwrap_err();
        assert!(err.to_string().contains("non-finite or negative"), "{err}");
    }

    #[test]
    fn test_weighted_sum() {
        let w = Weights::new(vec![0.5, 0.3, 0.2]).unwrap();
        assert!((w.coalition_value(Coalition::full(3)) - 1.0).abs() < 1e-12);
        assert!((w.coalition_value(Coalition::from_criteria([1, 2])) - 0.5).abs() < 1e-12);
        assert_eq!(w.coalition_value(Coalition::EMPTY), 0.0);
    }
}
