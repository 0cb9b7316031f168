//! Order and profile-count search around the per-order program.

use super::config::MipConfig;
use super::formulation::solve_order;
use crate::error::{Result, SrmpError};
use crate::learn::check_training_set;
use crate::model::SrmpModel;
use crate::relations::PreferenceStructure;
use crate::table::NormalTable;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of an exact fit.
#[derive(Debug, Clone)]
pub struct MipResult {
    /// Best model, `None` when no program had a solution.
    pub model: Option<SrmpModel>,

    /// Satisfied share of the comparisons for `model`.
    pub fitness: f64,

    /// Number of profiles of `model` (0 without a model).
    pub profiles: usize,

    /// Number of programs solved.
    pub orders_tried: usize,

    pub elapsed: Duration,
}

/// Permutations of `0..k` in lexicographic order.
pub(crate) struct Permutations {
    next: Option<Vec<usize>>,
}

impl Permutations {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            next: Some((0..k).collect()),
        }
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        // next lexicographic permutation
        if let Some(i) = (1..successor.len()).rev().find(|&i| successor[i - 1] < successor[i]) {
            let pivot = i - 1;
            if let Some(j) = (i..successor.len()).rev().find(|&j| successor[j] > successor[pivot]) {
                successor.swap(pivot, j);
                successor[i..].reverse();
                self.next = Some(successor);
            }
        }
        Some(current)
    }
}

/// Fits SRMP models exactly with one MIP per lexicographic order.
pub struct MipLearner;

impl MipLearner {
    /// Searches profile counts and orders, keeping the best fit.
    ///
    /// Stops at the first perfect fit. Infeasible programs score 0 and are
    /// skipped.
    pub fn fit(
        table: &NormalTable,
        comparisons: &PreferenceStructure,
        config: &MipConfig,
    ) -> Result<MipResult> {
        config.validate().map_err(SrmpError::InvalidConfig)?;
        check_training_set(table, comparisons)?;
        let m = table.n_criteria();
        if config.gamma * m as f64 > 1.0 {
            return Err(SrmpError::InvalidConfig(format!(
                "gamma {} leaves no room for {m} weights of at least gamma",
                config.gamma
            )));
        }

        let started = Instant::now();
        let mut best: Option<(SrmpModel, f64)> = None;
        let mut orders_tried = 0usize;

        'search: for k in config.profiles.candidates() {
            let orders: Box<dyn Iterator<Item = Vec<usize>>> = match &config.lexicographic_order {
                Some(order) => Box::new(std::iter::once(order.clone())),
                None => Box::new(Permutations::new(k)),
            };
            for order in orders {
                let solved = solve_order(table, comparisons, &order, config)?;
                orders_tried += 1;
                debug!(k, ?order, status = ?solved.status, fitness = solved.fitness, "order solved");
                let Some(model) = solved.model else {
                    continue;
                };
                if best.as_ref().is_none_or(|(_, f)| solved.fitness > *f) {
                    best = Some((model, solved.fitness));
                }
                if solved.fitness >= 1.0 {
                    break 'search;
                }
            }
        }

        let elapsed = started.elapsed();
        let (model, fitness) = match best {
            Some((model, fitness)) => (Some(model), fitness),
            None => (None, 0.0),
        };
        let profiles = model.as_ref().map_or(0, SrmpModel::k);
        info!(
            found = model.is_some(),
            profiles,
            fitness,
            orders_tried,
            elapsed_ms = elapsed.as_millis() as u64,
            "exact fit finished"
        );
        Ok(MipResult {
            model,
            fitness,
            profiles,
            orders_tried,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::comparisons;
    use crate::mip::ProfileCount;
    use crate::model::Weights;
    use crate::relations::Relation;
    use u_numflow::random::create_rng;

    #[test]
    fn test_permutations() {
        let all: Vec<Vec<usize>> = Permutations::new(3).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
        assert_eq!(Permutations::new(1).count(), 1);
    }

    fn known_model_data() -> (NormalTable, PreferenceStructure) {
        let truth = SrmpModel::srmp(
            Weights::new(vec![0.6, 0.4]).unwrap(),
            vec![vec![0.5, 0.5]],
            vec![0],
        )
        .unwrap();
        let table = NormalTable::from_rows(vec![
            vec![0.9, 0.9],
            vec![0.7, 0.2],
            vec![0.2, 0.8],
            vec![0.1, 0.1],
            vec![0.55, 0.3],
        ])
        .unwrap();
        let ranking = truth.rank(&table).unwrap();
        let d: PreferenceStructure = ranking
            .to_preference_structure()
            .relations()
            .filter(|r| r.kind == crate::relations::RelationKind::Preference)
            .copied()
            .collect();
        (table, d)
    }

    #[test]
    fn test_exact_on_known_model() {
        let (table, d) = known_model_data();
        let config = MipConfig::default().with_inconsistencies(false);
        let result = MipLearner::fit(&table, &d, &config).unwrap();
        assert_eq!(result.fitness, 1.0);
        assert_eq!(result.profiles, 1);
        let model = result.model.unwrap();
        assert_eq!(model.rank(&table).unwrap().fitness(&d).unwrap(), 1.0);
    }

    #[test]
    fn test_max_profiles_stops_at_perfect_fit() {
        let (table, d) = known_model_data();
        let config = MipConfig::default().with_profiles(ProfileCount::Max(2));
        let result = MipLearner::fit(&table, &d, &config).unwrap();
        assert_eq!(result.fitness, 1.0);
        assert_eq!(result.profiles, 1);
        assert_eq!(result.orders_tried, 1);
    }

    #[test]
    fn test_strict_without_solution_is_none() {
        let table = NormalTable::from_rows(vec![vec![0.9], vec![0.5], vec![0.1]]).unwrap();
        let d = PreferenceStructure::from_relations([
            Relation::preference(0, 1),
            Relation::preference(1, 2),
            Relation::preference(2, 0),
        ])
        .unwrap();
        let config = MipConfig::default()
            .with_inconsistencies(false)
            .with_profiles(ProfileCount::Max(2));
        let result = MipLearner::fit(&table, &d, &config).unwrap();
        assert!(result.model.is_none());
        assert_eq!(result.fitness, 0.0);
        assert_eq!(result.profiles, 0);
        assert_eq!(result.orders_tried, 3);
    }

    #[test]
    fn test_tolerant_generated_data() {
        let mut rng = create_rng(31);
        let table = crate::generate::random_table(6, 2, &mut rng).unwrap();
        let truth = crate::generate::random_model(crate::model::ModelKind::Srmp, 1, 2, &mut rng)
            .unwrap();
        let d = comparisons(&truth.rank(&table).unwrap(), 8, 0.0, &mut rng).unwrap();
        let result = MipLearner::fit(&table, &d, &MipConfig::default()).unwrap();
        assert!(result.model.is_some());
        assert!((0.0..=1.0).contains(&result.fitness));
    }

    #[test]
    fn test_strict_exact_on_generated_two_profiles() {
        for seed in 100..104 {
            let mut rng = create_rng(seed);
            let table = crate::generate::random_table(8, 3, &mut rng).unwrap();
            let truth =
                crate::generate::random_model(crate::model::ModelKind::Srmp, 2, 3, &mut rng)
                    .unwrap();
            let d = comparisons(&truth.rank(&table).unwrap(), 14, 0.0, &mut rng).unwrap();
            let config = MipConfig::default()
                .with_inconsistencies(false)
                .with_profiles(ProfileCount::Exact(2));
            let result = MipLearner::fit(&table, &d, &config).unwrap();
            assert_eq!(result.fitness, 1.0, "seed {seed}");
            let model = result.model.unwrap();
            assert_eq!(model.k(), 2);
            assert_eq!(model.fitness(&table, &d).unwrap(), 1.0, "seed {seed}");
        }
    }

    #[test]
    fn test_fixed_order_must_be_permutation() {
        let (table, d) = known_model_data();
        for (k, order) in [(1, vec![3]), (2, vec![0, 0])] {
            let config = MipConfig::default()
                .with_profiles(ProfileCount::Exact(k))
                .with_lexicographic_order(order);
            assert!(matches!(
                MipLearner::fit(&table, &d, &config),
                Err(SrmpError::InvalidLexicographicOrder { .. })
            ));
        }
    }

    #[test]
    fn test_gamma_too_large_for_criteria() {
        let table = NormalTable::from_rows(vec![vec![0.1, 0.2, 0.3], vec![0.3, 0.2, 0.1]]).unwrap();
        let d = PreferenceStructure::from_relations([Relation::preference(0, 1)]).unwrap();
        let config = MipConfig::default().with_gamma(0.5);
        assert!(matches!(
            MipLearner::fit(&table, &d, &config),
            Err(SrmpError::InvalidConfig(_))
        ));
    }
}
