//! SRMP/RMP model and the ranking rule.

use super::capacity::PowerSet;
use super::importance::{CoalitionValue, Importance, Weights};
use super::outranking::{lexicographic_ranking, profile_outranking};
use crate::error::{Result, SrmpError};
use crate::relations::{OutrankingMatrix, PreferenceStructure, Ranking};
use crate::scale::Scale;
use crate::table::{NormalTable, PerformanceTable};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Most profiles a model may hold (the aggregation packs one bit per profile).
pub const MAX_PROFILES: usize = 63;

/// Which importance representation a model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    /// Additive weights.
    #[default]
    Srmp,
    /// Monotone capacities over every coalition.
    Rmp,
}

/// An SRMP (weights) or RMP (capacities) model.
///
/// Profiles live on the normal scale: `profiles[h][j]` is the level of
/// profile `h` on criterion `j`, non-decreasing in `h`.
///
/// # Examples
///
/// ```
/// use u_srmp::model::{Importance, SrmpModel, Weights};
/// use u_srmp::table::NormalTable;
///
/// let model = SrmpModel::new(
///     Importance::Weights(Weights::new(vec![0.5, 0.3, 0.2]).unwrap()),
///     vec![vec![0.5, 0.5, 0.5]],
///     vec![0],
/// ).unwrap();
/// let table = NormalTable::from_rows(vec![vec![0.6, 0.6, 0.6], vec![0.4, 0.4, 0.4]]).unwrap();
/// let ranking = model.rank(&table).unwrap();
/// assert!(ranking.rank_of(0) < ranking.rank_of(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SrmpModel {
    pub(crate) importance: Importance,
    pub(crate) profiles: Vec<Vec<f64>>,
    pub(crate) lexicographic_order: Vec<usize>,
}

impl SrmpModel {
    /// Builds a model, checking every structural invariant.
    pub fn new(
        importance: Importance,
        profiles: Vec<Vec<f64>>,
        lexicographic_order: Vec<usize>,
    ) -> Result<Self> {
        let model = Self {
            importance,
            profiles,
            lexicographic_order,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn srmp(weights: Weights, profiles: Vec<Vec<f64>>, order: Vec<usize>) -> Result<Self> {
        Self::new(Importance::Weights(weights), profiles, order)
    }

    pub fn rmp(capacities: PowerSet, profiles: Vec<Vec<f64>>, order: Vec<usize>) -> Result<Self> {
        Self::new(Importance::Capacities(capacities), profiles, order)
    }

    /// Re-checks every structural invariant.
    pub fn validate(&self) -> Result<()> {
        let k = self.profiles.len();
        let m = self.importance.n_criteria();
        if k == 0 || k > MAX_PROFILES {
            return Err(SrmpError::InvalidModel(format!(
                "expected 1..={MAX_PROFILES} profiles, got {k}"
            )));
        }
        for (h, profile) in self.profiles.iter().enumerate() {
            if profile.len() != m {
                return Err(SrmpError::ShapeMismatch(format!(
                    "profile {h} has {} values for {m} criteria",
                    profile.len()
                )));
            }
            if let Some(x) = profile.iter().find(|x| !(0.0..=1.0).contains(*x)) {
                return Err(SrmpError::OutOfScale {
                    value: x.to_string(),
                    scale: "normal".into(),
                });
            }
        }
        for h in 1..k {
            if let Some(j) = (0..m).find(|&j| self.profiles[h - 1][j] > self.profiles[h][j]) {
                return Err(SrmpError::InvalidModel(format!(
                    "profiles {} and {h} are not sorted on criterion {j}",
                    h - 1
                )));
            }
        }
        check_permutation(&self.lexicographic_order, k)?;
        if let Importance::Capacities(mu) = &self.importance {
            mu.validate()?;
        }
        Ok(())
    }

    pub fn k(&self) -> usize {
        self.profiles.len()
    }

    pub fn n_criteria(&self) -> usize {
        self.importance.n_criteria()
    }

    pub fn importance(&self) -> &Importance {
        &self.importance
    }

    pub fn weights(&self) -> Option<&Weights> {
        match &self.importance {
            Importance::Weights(w) => Some(w),
            Importance::Capacities(_) => None,
        }
    }

    pub fn capacities(&self) -> Option<&PowerSet> {
        match &self.importance {
            Importance::Capacities(c) => Some(c),
            Importance::Weights(_) => None,
        }
    }

    pub fn is_rmp(&self) -> bool {
        matches!(self.importance, Importance::Capacities(_))
    }

    pub fn kind(&self) -> ModelKind {
        match self.importance {
            Importance::Weights(_) => ModelKind::Srmp,
            Importance::Capacities(_) => ModelKind::Rmp,
        }
    }

    pub fn profiles(&self) -> &[Vec<f64>] {
        &self.profiles
    }

    pub fn lexicographic_order(&self) -> &[usize] {
        &self.lexicographic_order
    }

    /// Same model with another lexicographic order.
    pub fn with_lexicographic_order(&self, order: Vec<usize>) -> Result<Self> {
        check_permutation(&order, self.k())?;
        Ok(Self {
            lexicographic_order: order,
            ..self.clone()
        })
    }

    fn check_table(&self, table: &NormalTable) -> Result<()> {
        if table.n_criteria() < self.n_criteria() {
            return Err(SrmpError::ShapeMismatch(format!(
                "table has {} criteria, model needs {}",
                table.n_criteria(),
                self.n_criteria()
            )));
        }
        Ok(())
    }

    /// One outranking matrix per profile, in profile order.
    pub fn profile_matrices(&self, table: &NormalTable) -> Result<Vec<OutrankingMatrix>> {
        self.check_table(table)?;
        let importance = &self.importance;
        #[cfg(feature = "parallel")]
        let matrices = self
            .profiles
            .par_iter()
            .map(|p| profile_outranking(table, p, importance))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let matrices = self
            .profiles
            .iter()
            .map(|p| profile_outranking(table, p, importance))
            .collect();
        Ok(matrices)
    }

    /// Ranks the alternatives of a normal-scale table.
    ///
    /// Criteria are matched by position; trailing extra criteria are ignored.
    pub fn rank(&self, table: &NormalTable) -> Result<Ranking> {
        check_permutation(&self.lexicographic_order, self.k())?;
        let matrices = self.profile_matrices(table)?;
        Ok(lexicographic_ranking(&matrices, &self.lexicographic_order))
    }

    /// Ranks a table on arbitrary scales by normalizing it first.
    pub fn rank_table(&self, table: &PerformanceTable) -> Result<Ranking> {
        self.rank(&table.normalize()?)
    }

    /// Fraction of `comparisons` reproduced by the ranking of `table`.
    pub fn fitness(&self, table: &NormalTable, comparisons: &PreferenceStructure) -> Result<f64> {
        if comparisons.is_empty() {
            return Err(SrmpError::EmptyComparisons);
        }
        self.rank(table)?.fitness(comparisons)
    }

    /// Profiles expressed on the original criteria scales.
    pub fn denormalized_profiles(&self, scales: &[Scale]) -> Result<PerformanceTable> {
        let labels = (0..self.k()).map(|h| format!("p{h}")).collect();
        let criteria = (0..self.n_criteria()).map(|j| j.to_string()).collect();
        NormalTable::new(labels, criteria, self.profiles.clone())?.denormalize(scales)
    }
}

pub(crate) fn check_permutation(order: &[usize], k: usize) -> Result<()> {
    let mut seen = vec![false; k];
    let valid = order.len() == k
        && order.iter().all(|&h| {
            if h >= k || seen[h] {
                false
            } else {
                seen[h] = true;
                true
            }
        });
    if valid {
        Ok(())
    } else {
        Err(SrmpError::InvalidLexicographicOrder {
            order: order.to_vec(),
            profiles: k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coalition;
    use crate::relations::Relation;
    use crate::scale::{PreferenceDirection, QuantitativeScale, Value};

    fn weights(w: &[f64]) -> Importance {
        Importance::Weights(Weights::new(w.to_vec()).unwrap())
    }

    fn five_by_three() -> NormalTable {
        NormalTable::from_rows(vec![
            vec![0.6, 0.6, 0.6],
            vec![0.4, 0.4, 0.4],
            vec![0.7, 0.2, 0.9],
            vec![0.1, 0.8, 0.3],
            vec![0.5, 0.5, 0.1],
        ])
        .unwrap()
    }

    #[test]
    fn test_concrete_scenario() {
        let model =
            SrmpModel::new(weights(&[0.5, 0.3, 0.2]), vec![vec![0.5, 0.5, 0.5]], vec![0]).unwrap();
        let r = model.rank(&five_by_three()).unwrap();
        assert!(r.rank_of(0).unwrap() < r.rank_of(1).unwrap());
        // strengths: A=1.0, B=0.0, 0.7, 0.3, 0.8
        assert_eq!(r.to_vec(), vec![1, 5, 3, 4, 2]);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let model = SrmpModel::new(
            weights(&[0.2, 0.3, 0.5]),
            vec![vec![0.3, 0.3, 0.3], vec![0.6, 0.6, 0.6]],
            vec![1, 0],
        )
        .unwrap();
        let t = five_by_three();
        assert_eq!(model.rank(&t).unwrap(), model.rank(&t).unwrap());
    }

    #[test]
    fn test_tie_breaking_by_second_profile() {
        // profile 0 at 0: every alternative meets it on every criterion
        let t = NormalTable::from_rows(vec![vec![0.9, 0.1], vec![0.1, 0.9], vec![0.1, 0.1]])
            .unwrap();
        let w = weights(&[0.6, 0.4]);
        let model =
            SrmpModel::new(w.clone(), vec![vec![0.0, 0.0], vec![0.5, 0.5]], vec![0, 1]).unwrap();
        let only_second = SrmpModel::new(w, vec![vec![0.5, 0.5]], vec![0]).unwrap();
        let expected = only_second.rank(&t).unwrap();
        assert_eq!(expected.to_vec(), vec![1, 2, 3]);
        assert_eq!(model.rank(&t).unwrap(), expected);
        let swapped = model.with_lexicographic_order(vec![1, 0]).unwrap();
        assert_eq!(swapped.rank(&t).unwrap(), expected);
    }

    #[test]
    fn test_order_matters_with_informative_first_profile() {
        let t = NormalTable::from_rows(vec![vec![0.9, 0.1], vec![0.4, 0.9]]).unwrap();
        let model = SrmpModel::new(
            weights(&[0.6, 0.4]),
            vec![vec![0.3, 0.3], vec![0.8, 0.8]],
            vec![0, 1],
        )
        .unwrap();
        // profile 0: alt 1 meets both criteria (1.0) vs alt 0 only c0 (0.6)
        assert_eq!(model.rank(&t).unwrap().to_vec(), vec![2, 1]);
        // profile 1: alt 0 meets c0 (0.6) vs alt 1 meets c1 (0.4)
        let swapped = model.with_lexicographic_order(vec![1, 0]).unwrap();
        assert_eq!(swapped.rank(&t).unwrap().to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_rmp_uses_capacities() {
        let mut mu = PowerSet::new(2).unwrap();
        mu.set(Coalition::from_criteria([1]), 1.0).unwrap();
        let model = SrmpModel::rmp(mu, vec![vec![0.5, 0.5]], vec![0]).unwrap();
        let t = NormalTable::from_rows(vec![vec![0.9, 0.1], vec![0.1, 0.9]]).unwrap();
        assert_eq!(model.rank(&t).unwrap().to_vec(), vec![2, 1]);
        assert!(model.is_rmp() && model.weights().is_none());
        assert_eq!(model.kind(), ModelKind::Rmp);
    }

    #[test]
    fn test_invalid_models() {
        assert!(matches!(
            SrmpModel::new(weights(&[1.0]), vec![vec![0.5]], vec![1]),
            Err(SrmpError::InvalidLexicographicOrder { .. })
        ));
        assert!(matches!(
            SrmpModel::new(weights(&[1.0]), vec![vec![0.5], vec![0.6]], vec![0, 0]),
            Err(SrmpError::InvalidLexicographicOrder { .. })
        ));
        assert!(SrmpModel::new(weights(&[1.0]), vec![vec![0.6], vec![0.5]], vec![0, 1]).is_err());
        assert!(SrmpModel::new(weights(&[0.5, 0.5]), vec![vec![0.5]], vec![0]).is_err());
        assert!(SrmpModel::new(weights(&[1.0]), vec![], vec![]).is_err());
    }

    #[test]
    fn test_rank_rejects_narrow_table() {
        let model = SrmpModel::new(weights(&[0.5, 0.5]), vec![vec![0.5, 0.5]], vec![0]).unwrap();
        let t = NormalTable::from_rows(vec![vec![0.5]]).unwrap();
        assert!(matches!(model.rank(&t), Err(SrmpError::ShapeMismatch(_))));
        let wide = NormalTable::from_rows(vec![vec![0.6, 0.6, 0.0], vec![0.1, 0.1, 1.0]]).unwrap();
        assert_eq!(model.rank(&wide).unwrap().to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_fitness() {
        let model = SrmpModel::new(weights(&[1.0]), vec![vec![0.5]], vec![0]).unwrap();
        let t = NormalTable::from_rows(vec![vec![0.9], vec![0.1], vec![0.2]]).unwrap();
        let d = PreferenceStructure::from_relations([
            Relation::preference(0, 1),
            Relation::indifference(1, 2),
            Relation::preference(2, 0),
        ])
        .unwrap();
        assert!((model.fitness(&t, &d).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!(matches!(
            model.fitness(&t, &PreferenceStructure::new()),
            Err(SrmpError::EmptyComparisons)
        ));
    }

    #[test]
    fn test_denormalized_profiles() {
        let model = SrmpModel::new(weights(&[1.0]), vec![vec![0.25]], vec![0]).unwrap();
        let price: Scale = QuantitativeScale::new(0.0, 100.0, PreferenceDirection::Min)
            .unwrap()
            .into();
        let p = model.denormalized_profiles(&[price]).unwrap();
        assert_eq!(p.value(0, 0), &Value::Number(75.0));
    }
}
