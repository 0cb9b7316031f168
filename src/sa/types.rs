//! Core trait for Simulated Annealing.

use rand::Rng;

/// Defines a Simulated Annealing problem.
///
/// The implementor supplies the initial state, the cost and the
/// neighborhood. The SA engine handles temperature management, the
/// acceptance criterion and termination.
///
/// # Minimization
///
/// SA minimizes the cost function. For maximization, negate the cost or
/// use `1 - score` when the score is bounded by 1.
///
/// # Examples
///
/// ```
/// use rand::Rng;
/// use u_srmp::sa::SaProblem;
///
/// struct Parabola;
///
/// impl SaProblem for Parabola {
///     type Solution = f64;
///
///     fn initial_solution<R: Rng>(&self, rng: &mut R) -> f64 {
///         rng.random_range(-10.0..10.0)
///     }
///
///     fn cost(&self, x: &f64) -> f64 {
///         x * x
///     }
///
///     fn neighbor<R: Rng>(&self, x: &f64, rng: &mut R) -> f64 {
///         x + rng.random_range(-1.0..1.0)
///     }
/// }
/// ```
pub trait SaProblem: Send + Sync {
    /// The solution representation type.
    type Solution: Clone + Send;

    /// Creates the starting solution.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Self::Solution;

    /// Computes the cost of a solution. Lower is better.
    fn cost(&self, solution: &Self::Solution) -> f64;

    /// Generates a neighbor of the current solution.
    ///
    /// The neighborhood must be connected: any solution reachable from
    /// any other via a sequence of moves.
    fn neighbor<R: Rng>(&self, solution: &Self::Solution, rng: &mut R) -> Self::Solution;

    /// Cost at which the search may stop immediately.
    ///
    /// `None` (the default) means no cost is known to be optimal.
    fn target_cost(&self) -> Option<f64> {
        None
    }
}
