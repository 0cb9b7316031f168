//! Monotone integer capacities over every subset of criteria (RMP).

use super::importance::{Coalition, CoalitionValue};
use crate::error::{Result, SrmpError};

/// Most criteria a [`PowerSet`] accepts (2^n stored values).
pub const MAX_CAPACITY_CRITERIA: usize = 20;

/// Capacity function `2^C -> N`, monotone with respect to inclusion.
///
/// Values are non-negative integers, `mu(empty) = 0` and
/// `mu(C) = |C| - 1` for the full set. Every write is checked against the
/// immediate subsets and supersets of the written coalition; since the
/// stored function is always monotone, that local check keeps it globally
/// monotone.
///
/// # Examples
///
/// ```
/// use u_srmp::model::{Coalition, PowerSet};
///
/// let mut mu = PowerSet::cardinality(3).unwrap();
/// mu.set(Coalition::from_criteria([0]), 2.0).unwrap();
/// assert!(mu.set(Coalition::from_criteria([0]), 3.0).is_err()); // above {0, 1} = 2
/// assert!(mu.set(Coalition::from_criteria([1]), 1.5).is_err()); // not an integer
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSet {
    n_criteria: usize,
    values: Vec<f64>,
}

impl PowerSet {
    fn blank(n_criteria: usize) -> Result<Self> {
        if n_criteria == 0 || n_criteria > MAX_CAPACITY_CRITERIA {
            return Err(SrmpError::InvalidModel(format!(
                "capacities need 1..={MAX_CAPACITY_CRITERIA} criteria, got {n_criteria}"
            )));
        }
        Ok(Self {
            n_criteria,
            values: vec![0.0; 1 << n_criteria],
        })
    }

    /// Smallest valid capacity: 0 everywhere except the full set.
    pub fn new(n_criteria: usize) -> Result<Self> {
        let mut mu = Self::blank(n_criteria)?;
        let full = mu.full().index();
        mu.values[full] = mu.full_value();
        Ok(mu)
    }

    /// `mu(S) = min(|S|, |C| - 1)`: every criterion counts the same.
    pub fn cardinality(n_criteria: usize) -> Result<Self> {
        let mut mu = Self::blank(n_criteria)?;
        let cap = mu.full_value();
        for (bits, v) in mu.values.iter_mut().enumerate() {
            *v = f64::from((bits as u64).count_ones()).min(cap);
        }
        Ok(mu)
    }

    /// Builds a capacity from values indexed by coalition bitset.
    pub fn from_values(n_criteria: usize, values: Vec<f64>) -> Result<Self> {
        let mut mu = Self::blank(n_criteria)?;
        if values.len() != mu.values.len() {
            return Err(SrmpError::ShapeMismatch(format!(
                "{} capacities for {} subsets",
                values.len(),
                mu.values.len()
            )));
        }
        mu.values = values;
        mu.validate()?;
        Ok(mu)
    }

    /// Capacity of the full set, `|C| - 1`.
    pub fn full_value(&self) -> f64 {
        (self.n_criteria - 1) as f64
    }

    pub fn n_criteria(&self) -> usize {
        self.n_criteria
    }

    pub fn full(&self) -> Coalition {
        Coalition::full(self.n_criteria)
    }

    pub fn get(&self, coalition: Coalition) -> f64 {
        self.values[coalition.index()]
    }

    /// All `(coalition, capacity)` pairs in bitset order.
    pub fn iter(&self) -> impl Iterator<Item = (Coalition, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(bits, &v)| (Coalition(bits as u64), v))
    }

    /// Interval `[lower, upper]` a new value for `coalition` may take
    /// without breaking monotonicity. `upper` is `None` for the full set.
    pub fn bounds(&self, coalition: Coalition) -> (f64, Option<f64>) {
        let mut lower = 0.0f64;
        let mut upper: Option<f64> = None;
        for j in 0..self.n_criteria {
            if coalition.contains(j) {
                lower = lower.max(self.get(coalition.without(j)));
            } else {
                let v = self.get(coalition.with(j));
                upper = Some(upper.map_or(v, |u| u.min(v)));
            }
        }
        (lower, upper)
    }

    /// Writes `mu(coalition) = value`, rejecting values that break
    /// monotonicity or the pinned integer values.
    pub fn set(&mut self, coalition: Coalition, value: f64) -> Result<()> {
        if coalition.index() >= self.values.len() {
            return Err(SrmpError::ShapeMismatch(format!(
                "coalition {coalition} outside {} criteria",
                self.n_criteria
            )));
        }
        let violation = |reason: String| SrmpError::CapacityViolation {
            subset: coalition.to_string(),
            value,
            reason,
        };
        self.check_pinned(coalition, value).map_err(violation)?;
        let (lower, upper) = self.bounds(coalition);
        if value < lower {
            return Err(violation(format!("below a subset valued {lower}")));
        }
        if let Some(upper) = upper {
            if value > upper {
                return Err(violation(format!("above a superset valued {upper}")));
            }
        }
        self.values[coalition.index()] = value;
        Ok(())
    }

    /// Value rules that do not depend on neighbouring coalitions.
    fn check_pinned(&self, coalition: Coalition, value: f64) -> std::result::Result<(), String> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err("capacities must be non-negative integers".into());
        }
        if coalition.is_empty() && value != 0.0 {
            return Err("the empty coalition has capacity 0".into());
        }
        if coalition.index() == self.full().index() && value != self.full_value() {
            return Err(format!("the full set has capacity {}", self.full_value()));
        }
        Ok(())
    }

    /// Checks the pinned values and monotonicity of every stored value.
    pub fn validate(&self) -> Result<()> {
        for (coalition, value) in self.iter() {
            let violation = |reason: String| SrmpError::CapacityViolation {
                subset: coalition.to_string(),
                value,
                reason,
            };
            self.check_pinned(coalition, value).map_err(violation)?;
            let (lower, _) = self.bounds(coalition);
            if value < lower {
                return Err(violation(format!("below a subset valued {lower}")));
            }
        }
        Ok(())
    }
}

impl CoalitionValue for PowerSet {
    fn n_criteria(&self) -> usize {
        self.n_criteria
    }

    fn coalition_value(&self, coalition: Coalition) -> f64 {
        self.get(Coalition(coalition.0 & self.full().0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_pins_full_set() {
        assert!(PowerSet::new(0).is_err());
        assert!(PowerSet::new(MAX_CAPACITY_CRITERIA + 1).is_err());
        let mu = PowerSet::new(3).unwrap();
        assert_eq!(mu.iter().count(), 8);
        assert_eq!(mu.get(mu.full()), 2.0);
        assert_eq!(mu.get(Coalition::from_criteria([0, 1])), 0.0);
        assert_eq!(PowerSet::new(1).unwrap().get(Coalition::full(1)), 0.0);
    }

    #[test]
    fn test_cardinality_capped_by_full_set() {
        let mu = PowerSet::cardinality(3).unwrap();
        assert_eq!(mu.get(Coalition::from_criteria([2])), 1.0);
        assert_eq!(mu.get(Coalition::from_criteria([0, 2])), 2.0);
        assert_eq!(mu.get(mu.full()), 2.0);
        assert!(mu.validate().is_ok());
    }

    #[test]
    fn test_empty_set_pinned() {
        let mut mu = PowerSet::cardinality(2).unwrap();
        assert!(matches!(
            mu.set(Coalition::EMPTY, 1.0),
            Err(SrmpError::CapacityViolation { .. })
        ));
        assert!(mu.set(Coalition::EMPTY, 0.0).is_ok());
    }

    #[test]
    fn test_full_set_pinned() {
        let mut mu = PowerSet::cardinality(3).unwrap();
        let full = mu.full();
        assert!(matches!(
            mu.set(full, 10.0),
            Err(SrmpError::CapacityViolation { .. })
        ));
        assert!(mu.set(full, 1.0).is_err());
        assert!(mu.set(full, 2.0).is_ok());
        assert!(PowerSet::from_values(2, vec![0.0, 1.0, 1.0, 2.0]).is_err());
    }

    #[test]
    fn test_integer_values_only() {
        let mut mu = PowerSet::cardinality(3).unwrap();
        assert!(mu.set(Coalition::from_criteria([0]), 0.5).is_err());
        assert!(mu.set(Coalition::from_criteria([0]), f64::NAN).is_err());
        assert!(PowerSet::from_values(2, vec![0.0, 0.5, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_set_respects_neighbours() {
        let mut mu = PowerSet::cardinality(3).unwrap();
        let single = Coalition::from_criteria([0]);
        let pair = Coalition::from_criteria([0, 1]);
        assert_eq!(mu.bounds(pair), (1.0, Some(2.0)));
        assert!(mu.set(pair, 3.0).is_err());
        mu.set(single, 0.0).unwrap();
        mu.set(pair, 1.0).unwrap();
        assert!(mu.set(single, 2.0).is_err());
        assert_eq!(mu.get(pair), 1.0);
        assert_eq!(mu.bounds(mu.full()), (2.0, None));
    }

    #[test]
    fn test_from_values_validates() {
        // {0} = 2 exceeds the full set, pinned to 1
        assert!(PowerSet::from_values(2, vec![0.0, 2.0, 0.0, 1.0]).is_err());
        assert!(PowerSet::from_values(2, vec![0.0, 1.0, 0.0, 1.0]).is_ok());
        assert!(PowerSet::from_values(2, vec![0.0, 1.0]).is_err());
    }

    proptest! {
        #[test]
        fn prop_writes_keep_monotonicity(
            writes in proptest::collection::vec((0u64..16, 0u8..5), 0..60)
        ) {
            let mut mu = PowerSet::cardinality(4).unwrap();
            for (bits, value) in writes {
                let _ = mu.set(Coalition(bits), f64::from(value));
            }
            prop_assert!(mu.validate().is_ok());
            prop_assert_eq!(mu.get(mu.full()), 3.0);
            for (s, vs) in mu.iter() {
                for (t, vt) in mu.iter() {
                    if s.0 & t.0 == s.0 {
                        prop_assert!(vs <= vt, "mu({}) = {} > mu({}) = {}", s, vs, t, vt);
                    }
                }
            }
        }
    }
}
