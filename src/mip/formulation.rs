//! The mixed-integer program for one lexicographic order.
//!
//! Variables, for training alternatives `a`, profiles `h`, criteria `j`:
//!
//! - `w_j in [gamma, 1]`, `sum_j w_j = 1`
//! - `p_hj in [0, 1]`, `p_(h-1)j <= p_hj`
//! - binary `d_ahj`: `d = 1` iff `x_aj >= p_hj`, with discordant values
//!   at least `gamma` below the profile
//! - `o_ahj = d_ahj * w_j` (McCormick envelope), so the strength of `a`
//!   against `h` is `C_ah = sum_j o_ahj`
//!
//! A preference `a P b` gets one binary per step `l` of the order: when set,
//! `C_a - C_b >= gamma` on profile `order[l]` and the strengths are equal on
//! every earlier profile. At most one step decides (exactly one when
//! inconsistencies are not tolerated). An indifference either forces equal
//! strengths on every profile or, when tolerated, gets one binary that
//! does so when set. The objective counts set binaries.

use super::config::MipConfig;
use crate::error::Result;
use crate::model::{check_permutation, SrmpModel, Weights};
use crate::relations::{PreferenceStructure, RelationKind};
use crate::table::NormalTable;
use good_lp::{
    constraint, microlp, variable, Constraint, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// No feasible solution exists.
    Infeasible,
    /// The objective is unbounded.
    Unbounded,
    /// The solver stopped for another reason.
    Failed,
}

/// Outcome of the program for one order.
#[derive(Debug, Clone)]
pub struct OrderSolution {
    pub status: SolverStatus,
    /// Satisfied share of the comparisons; 0 without a solution.
    pub fitness: f64,
    pub model: Option<SrmpModel>,
}

impl OrderSolution {
    fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            fitness: 0.0,
            model: None,
        }
    }

    pub fn is_solution_found(&self) -> bool {
        self.status == SolverStatus::Optimal
    }
}

/// Builds and solves the program for `order` (its length is `k`).
///
/// Callers validate the training set and the configuration.
pub fn solve_order(
    table: &NormalTable,
    comparisons: &PreferenceStructure,
    order: &[usize],
    config: &MipConfig,
) -> Result<OrderSolution> {
    let k = order.len();
    check_permutation(order, k)?;
    let m = table.n_criteria();
    let gamma = config.gamma;

    if !config.inconsistencies && comparisons.incomparables().next().is_some() {
        // a ranking never reproduces incomparability
        return Ok(OrderSolution::empty(SolverStatus::Infeasible));
    }

    let alternatives: Vec<usize> = comparisons.elements().into_iter().collect();
    let slot: BTreeMap<usize, usize> = alternatives
        .iter()
        .enumerate()
        .map(|(s, &a)| (a, s))
        .collect();

    let mut vars = ProblemVariables::new();
    let mut constraints: Vec<Constraint> = Vec::new();

    let weights: Vec<Variable> = (0..m)
        .map(|_| vars.add(variable().min(gamma).max(1.0)))
        .collect();
    let total: Expression = weights.iter().copied().sum();
    constraints.push(constraint!(total == 1.0));

    let profiles: Vec<Vec<Variable>> = (0..k)
        .map(|_| {
            (0..m)
                .map(|_| vars.add(variable().min(0.0).max(1.0)))
                .collect()
        })
        .collect();
    for h in 1..k {
        for j in 0..m {
            constraints.push(constraint!(profiles[h - 1][j] <= profiles[h][j]));
        }
    }

    let mut concordance: Vec<Vec<Vec<Variable>>> = Vec::with_capacity(alternatives.len());
    let mut strength: Vec<Vec<Expression>> = Vec::with_capacity(alternatives.len());
    for &a in &alternatives {
        let mut concordance_a = Vec::with_capacity(k);
        let mut strength_a = Vec::with_capacity(k);
        for profile in &profiles {
            let mut flags = Vec::with_capacity(m);
            let mut terms = Vec::with_capacity(m);
            for (j, &p) in profile.iter().enumerate() {
                let x = table.value(a, j);
                let d = vars.add(variable().binary());
                let o = vars.add(variable().min(0.0).max(1.0));
                constraints.push(constraint!(p + d <= x + 1.0));
                constraints.push(constraint!(p + d * (1.0 + gamma) >= x + gamma));
                constraints.push(constraint!(o <= weights[j]));
                constraints.push(constraint!(o <= d));
                constraints.push(constraint!(o + 1.0 >= weights[j] + d));
                flags.push(d);
                terms.push(o);
            }
            concordance_a.push(flags);
            strength_a.push(terms.into_iter().sum::<Expression>());
        }
        concordance.push(concordance_a);
        strength.push(strength_a);
    }
    let gap = |a: usize, b: usize, h: usize| strength[a][h].clone() - strength[b][h].clone();

    let mut satisfied: Vec<Variable> = Vec::new();
    for relation in comparisons.relations() {
        let (a, b) = (slot[&relation.a], slot[&relation.b]);
        match relation.kind {
            RelationKind::Preference => {
                let decide: Vec<Variable> = (0..k).map(|_| vars.add(variable().binary())).collect();
                for (l, &s) in decide.iter().enumerate() {
                    let lead = gap(a, b, order[l]);
                    constraints.push(constraint!(lead + 1.0 >= s * (1.0 + gamma)));
                    for &h in &order[..l] {
                        constraints.push(constraint!(gap(a, b, h) + s <= 1.0));
                        constraints.push(constraint!(gap(a, b, h) - s >= -1.0));
                    }
                }
                let decided: Expression = decide.iter().copied().sum();
                if config.inconsistencies {
                    constraints.push(constraint!(decided <= 1.0));
                } else {
                    constraints.push(constraint!(decided == 1.0));
                }
                satisfied.extend(decide);
            }
            RelationKind::Indifference if config.inconsistencies => {
                let t = vars.add(variable().binary());
                for h in 0..k {
                    constraints.push(constraint!(gap(a, b, h) + t <= 1.0));
                    constraints.push(constraint!(gap(a, b, h) - t >= -1.0));
                }
                satisfied.push(t);
            }
            RelationKind::Indifference => {
                for h in 0..k {
                    constraints.push(constraint!(gap(a, b, h) == 0.0));
                }
            }
            RelationKind::Incomparable => {}
        }
    }

    let objective: Expression = satisfied.iter().copied().sum();
    let problem = constraints
        .into_iter()
        .fold(vars.maximise(objective).using(microlp), |problem, c| problem.with(c));

    let solution = match problem.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => return Ok(OrderSolution::empty(SolverStatus::Infeasible)),
        Err(ResolutionError::Unbounded) => return Ok(OrderSolution::empty(SolverStatus::Unbounded)),
        Err(err) => {
            debug!(?order, error = %err, "solver failed");
            return Ok(OrderSolution::empty(SolverStatus::Failed));
        }
    };

    let fitness = if config.inconsistencies {
        let hits = satisfied.iter().filter(|&&v| solution.value(v) > 0.5).count();
        hits as f64 / comparisons.len() as f64
    } else {
        1.0
    };

    let weights = Weights::normalized(weights.iter().map(|&w| solution.value(w).max(0.0)).collect())?;

    // Snap each profile coordinate onto the lowest concordant training value
    // so that ranking reproduces the solver's coalitions exactly.
    let mut levels = vec![vec![1.0; m]; k];
    for h in 0..k {
        for j in 0..m {
            let lowest = alternatives
                .iter()
                .zip(&concordance)
                .filter(|(_, flags)| solution.value(flags[h][j]) > 0.5)
                .map(|(&a, _)| table.value(a, j))
                .fold(f64::INFINITY, f64::min);
            let level = if lowest.is_finite() { lowest } else { 1.0 };
            levels[h][j] = if h == 0 { level } else { level.max(levels[h - 1][j]) };
        }
    }

    let model = SrmpModel::srmp(weights, levels, order.to_vec())?;
    Ok(OrderSolution {
        status: SolverStatus::Optimal,
        fitness,
        model: Some(model),
    })
}
