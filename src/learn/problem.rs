//! Model fitting as an annealing problem: state, cost and moves.

use crate::error::Result;
use crate::generate::{balanced_model, profile_candidates};
use crate::model::{Coalition, Importance, ModelKind, SrmpModel};
use crate::relations::PreferenceStructure;
use crate::sa::SaProblem;
use crate::table::NormalTable;
use rand::Rng;
use u_numflow::random::{create_rng, shuffle};

/// Annealing over SRMP/RMP models of fixed `k` for one training set.
///
/// The cost of a model is `1 - fitness`; a perfect fit costs 0.
pub(crate) struct FitProblem<'a> {
    table: &'a NormalTable,
    comparisons: &'a PreferenceStructure,
    kind: ModelKind,
    k: usize,
    weight_step: f64,
    candidates: Vec<Vec<f64>>,
    start: SrmpModel,
}

/// Neighborhood operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Profile,
    Importance,
    Swap,
}

impl<'a> FitProblem<'a> {
    pub(crate) fn new(
        table: &'a NormalTable,
        comparisons: &'a PreferenceStructure,
        kind: ModelKind,
        k: usize,
        weight_step: f64,
    ) -> Result<Self> {
        let start = balanced_model(kind, k, table, &mut create_rng(0))?;
        Ok(Self {
            table,
            comparisons,
            kind,
            k,
            weight_step,
            candidates: profile_candidates(table),
            start,
        })
    }

    fn n_criteria(&self) -> usize {
        self.table.n_criteria()
    }

    /// Selection weights: `k * m` for profiles, `m` (SRMP) or `2^m - 2`
    /// (RMP, the free coalitions) for importance, `k` for the order.
    fn move_weights(&self) -> [(Move, usize); 3] {
        let m = self.n_criteria();
        let importance = match self.kind {
            ModelKind::Srmp if m < 2 => 0,
            ModelKind::Srmp => m,
            ModelKind::Rmp => (1usize << m) - 2,
        };
        let swap = if self.k < 2 { 0 } else { self.k };
        [
            (Move::Profile, self.k * m),
            (Move::Importance, importance),
            (Move::Swap, swap),
        ]
    }

    fn pick_move<R: Rng>(&self, rng: &mut R) -> Option<Move> {
        let weights = self.move_weights();
        let total: usize = weights.iter().map(|(_, w)| w).sum();
        if total == 0 {
            return None;
        }
        let mut r = rng.random_range(0..total);
        for (mv, w) in weights {
            if r < w {
                return Some(mv);
            }
            r -= w;
        }
        None
    }

    /// Moves one profile coordinate to an adjacent candidate level while
    /// keeping profiles sorted.
    fn move_profile<R: Rng>(&self, model: &mut SrmpModel, rng: &mut R) {
        let h = rng.random_range(0..self.k);
        let j = rng.random_range(0..self.n_criteria());
        let levels = &self.candidates[j];
        let current = model.profiles[h][j];
        let lower = if h == 0 { 0.0 } else { model.profiles[h - 1][j] };
        let upper = model.profiles.get(h + 1).map_or(1.0, |p| p[j]);

        let below = levels.iter().rev().find(|&&x| x < current).copied();
        let above = levels.iter().find(|&&x| x > current).copied();
        let options: Vec<f64> = [below, above]
            .into_iter()
            .flatten()
            .filter(|x| (lower..=upper).contains(x))
            .collect();
        if !options.is_empty() {
            model.profiles[h][j] = options[rng.random_range(0..options.len())];
        }
    }

    fn move_importance<R: Rng>(&self, model: &mut SrmpModel, rng: &mut R) {
        match &mut model.importance {
            Importance::Weights(weights) => {
                let w = weights.as_mut_slice();
                let m = w.len();
                if m < 2 {
                    return;
                }
                let from = rng.random_range(0..m);
                let to = (from + rng.random_range(1..m)) % m;
                let amount = w[from].min(self.weight_step) * rng.random_range(0.0..=1.0);
                w[from] -= amount;
                w[to] += amount;
            }
            Importance::Capacities(mu) => {
                // the empty and full sets are pinned
                let full = mu.full().0;
                if full < 2 {
                    return;
                }
                let coalition = Coalition(rng.random_range(1..full));
                let value = mu.get(coalition);
                let (lower, Some(upper)) = mu.bounds(coalition) else {
                    return;
                };
                let options: Vec<f64> = [value - 1.0, value + 1.0]
                    .into_iter()
                    .filter(|x| *x >= lower && *x <= upper)
                    .collect();
                if !options.is_empty() {
                    let next = options[rng.random_range(0..options.len())];
                    let written = mu.set(coalition, next);
                    debug_assert!(
                        written.is_ok(),
                        "capacity step inside bounds refused: {written:?}"
                    );
                }
            }
        }
    }

    fn move_swap<R: Rng>(&self, model: &mut SrmpModel, rng: &mut R) {
        let i = rng.random_range(0..self.k - 1);
        model.lexicographic_order.swap(i, i + 1);
    }
}

impl SaProblem for FitProblem<'_> {
    type Solution = SrmpModel;

    /// Balanced model with a random lexicographic order.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> SrmpModel {
        let mut model = self.start.clone();
        shuffle(&mut model.lexicographic_order, rng);
        model
    }

    fn cost(&self, model: &SrmpModel) -> f64 {
        model
            .fitness(self.table, self.comparisons)
            .map_or(1.0, |fitness| 1.0 - fitness)
    }

    fn neighbor<R: Rng>(&self, model: &SrmpModel, rng: &mut R) -> SrmpModel {
        let mut next = model.clone();
        match self.pick_move(rng) {
            Some(Move::Profile) => self.move_profile(&mut next, rng),
            Some(Move::Importance) => self.move_importance(&mut next, rng),
            Some(Move::Swap) => self.move_swap(&mut next, rng),
            None => {}
        }
        next
    }

    fn target_cost(&self) -> Option<f64> {
        Some(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::random_table;
    use crate::relations::Relation;

    fn data() -> (NormalTable, PreferenceStructure) {
        let table = random_table(8, 3, &mut create_rng(11)).unwrap();
        let comparisons =
            PreferenceStructure::from_relations([Relation::preference(0, 1), Relation::preference(2, 3)])
                .unwrap();
        (table, comparisons)
    }

    #[test]
    fn test_neighbors_stay_valid() {
        let (table, comparisons) = data();
        for kind in [ModelKind::Srmp, ModelKind::Rmp] {
            let problem = FitProblem::new(&table, &comparisons, kind, 3, 0.1).unwrap();
            let mut rng = create_rng(12);
            let mut model = problem.initial_solution(&mut rng);
            for _ in 0..500 {
                model = problem.neighbor(&model, &mut rng);
                assert!(model.validate().is_ok(), "{model:?}");
            }
        }
    }

    #[test]
    fn test_move_weights() {
        let (table, comparisons) = data();
        let srmp = FitProblem::new(&table, &comparisons, ModelKind::Srmp, 2, 0.1).unwrap();
        assert_eq!(
            srmp.move_weights(),
            [(Move::Profile, 6), (Move::Importance, 3), (Move::Swap, 2)]
        );
        let rmp = FitProblem::new(&table, &comparisons, ModelKind::Rmp, 1, 0.1).unwrap();
        assert_eq!(
            rmp.move_weights(),
            [(Move::Profile, 3), (Move::Importance, 6), (Move::Swap, 0)]
        );
    }

    #[test]
    fn test_capacity_moves_keep_full_set() {
        let (table, comparisons) = data();
        let problem = FitProblem::new(&table, &comparisons, ModelKind::Rmp, 1, 0.1).unwrap();
        let mut rng = create_rng(15);
        let mut model = problem.initial_solution(&mut rng);
        for _ in 0..300 {
            problem.move_importance(&mut model, &mut rng);
            let mu = model.capacities().unwrap();
            assert_eq!(mu.get(mu.full()), 2.0);
            assert!(mu.iter().all(|(_, v)| v.fract() == 0.0 && v <= 2.0));
            assert!(mu.validate().is_ok());
        }
    }

    #[test]
    fn test_profile_moves_between_candidates() {
        let table = NormalTable::from_rows(vec![vec![0.2], vec![0.6]]).unwrap();
        let comparisons = PreferenceStructure::from_relations([Relation::preference(0, 1)]).unwrap();
        let problem = FitProblem::new(&table, &comparisons, ModelKind::Srmp, 1, 0.1).unwrap();
        let mut rng = create_rng(13);
        let mut model = problem.initial_solution(&mut rng);
        for _ in 0..50 {
            problem.move_profile(&mut model, &mut rng);
            let p = model.profiles()[0][0];
            assert!([0.0, 0.4, 1.0].iter().any(|c| (c - p).abs() < 1e-12), "{p}");
        }
    }

    #[test]
    fn test_cost_is_one_minus_fitness() {
        let (table, comparisons) = data();
        let problem = FitProblem::new(&table, &comparisons, ModelKind::Srmp, 1, 0.1).unwrap();
        let model = problem.initial_solution(&mut create_rng(14));
        let fitness = model.fitness(&table, &comparisons).unwrap();
        assert!((problem.cost(&model) - (1.0 - fitness)).abs() < 1e-12);
    }
}
