//! SA execution loop.

use super::config::SaConfig;
use super::types::SaProblem;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};
use u_numflow::random::create_rng;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The best cost reached [`SaProblem::target_cost`].
    Converged,
    /// The temperature dropped below the minimum.
    Cooled,
    /// `max_iterations` was reached.
    IterationLimit,
    /// `max_non_improving` iterations passed without a new best.
    NonImproving,
    /// `max_time` elapsed.
    TimeLimit,
    /// The cancellation token was raised.
    Cancelled,
}

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult<S: Clone> {
    /// The best solution found.
    pub best: S,

    /// Cost of the best solution.
    pub best_cost: f64,

    /// Total number of iterations (neighbor evaluations).
    pub iterations: usize,

    /// Final temperature when the algorithm stopped.
    pub final_temperature: f64,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of strictly improving moves.
    pub improving_moves: usize,

    pub termination: Termination,

    /// Best cost after each new best, starting with the initial cost.
    pub cost_history: Vec<f64>,
}

impl<S: Clone> SaResult<S> {
    pub fn cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Executes the Simulated Annealing algorithm.
pub struct SaRunner;

impl SaRunner {
    /// Runs SA optimization.
    pub fn run<P: SaProblem>(problem: &P, config: &SaConfig) -> Result<SaResult<P::Solution>, String> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs SA with an optional cancellation token.
    pub fn run_with_cancel<P: SaProblem>(
        problem: &P,
        config: &SaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SaResult<P::Solution>, String> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        let started = Instant::now();
        let target = problem.target_cost();
        let reached = |cost: f64| target.is_some_and(|t| cost <= t);

        let mut current = problem.initial_solution(&mut rng);
        let mut current_cost = problem.cost(&current);
        let mut best = current.clone();
        let mut best_cost = current_cost;
        let mut cost_history = vec![best_cost];

        let mut temperature = config.initial_temperature;
        let mut total_iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut non_improving = 0usize;

        let termination = 'search: {
            if reached(best_cost) {
                break 'search Termination::Converged;
            }
            while temperature > config.min_temperature {
                for _ in 0..config.iterations_per_temperature {
                    if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                        break 'search Termination::Cancelled;
                    }
                    if config.max_iterations > 0 && total_iterations >= config.max_iterations {
                        break 'search Termination::IterationLimit;
                    }
                    if config.max_time.is_some_and(|budget| started.elapsed() >= budget) {
                        break 'search Termination::TimeLimit;
                    }

                    let neighbor = problem.neighbor(&current, &mut rng);
                    let neighbor_cost = problem.cost(&neighbor);
                    let delta = neighbor_cost - current_cost;

                    // Metropolis acceptance criterion
                    let accept = if delta <= 0.0 {
                        if delta < 0.0 {
                            improving_moves += 1;
                        }
                        true
                    } else {
                        let probability = (-delta / temperature).exp();
                        let probability = if probability.is_finite() { probability } else { 0.0 };
                        rng.random_range(0.0..1.0) < probability
                    };
                    total_iterations += 1;

                    if accept {
                        current = neighbor;
                        current_cost = neighbor_cost;
                        accepted_moves += 1;
                    }

                    if current_cost < best_cost {
                        best = current.clone();
                        best_cost = current_cost;
                        cost_history.push(best_cost);
                        non_improving = 0;
                        trace!(iteration = total_iterations, best_cost, "new best");
                        if reached(best_cost) {
                            break 'search Termination::Converged;
                        }
                    } else {
                        non_improving += 1;
                        if config.max_non_improving > 0 && non_improving >= config.max_non_improving {
                            break 'search Termination::NonImproving;
                        }
                    }
                }

                temperature *= config.alpha;
                debug!(temperature, best_cost, current_cost, "cooled");
            }
            Termination::Cooled
        };

        Ok(SaResult {
            best,
            best_cost,
            iterations: total_iterations,
            final_temperature: temperature,
            accepted_moves,
            improving_moves,
            termination,
            cost_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // ---- Quadratic minimization: f(x) = x^2, minimum at 0 ----

    struct QuadraticProblem;

    impl SaProblem for QuadraticProblem {
        type Solution = f64;

        fn initial_solution<R: Rng>(&self, rng: &mut R) -> f64 {
            rng.random_range(-10.0..10.0)
        }

        fn cost(&self, x: &f64) -> f64 {
            x * x
        }

        fn neighbor<R: Rng>(&self, x: &f64, rng: &mut R) -> f64 {
            x + rng.random_range(-1.0..1.0)
        }
    }

    #[test]
    fn test_sa_quadratic() {
        let config = SaConfig::default()
            .with_initial_temperature(100.0)
            .with_min_temperature(0.001)
            .with_alpha(0.95)
            .with_iterations_per_temperature(50)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        assert!(
            result.best_cost < 1.0,
            "expected near-zero cost, got {}",
            result.best_cost
        );
        assert!(result.improving_moves > 0);
        assert!(result.accepted_moves > result.improving_moves);
        assert_eq!(result.termination, Termination::Cooled);
    }

    #[test]
    fn test_sa_invalid_config() {
        let config = SaConfig::default().with_alpha(2.0);
        assert!(SaRunner::run(&QuadraticProblem, &config).is_err());
    }

    #[test]
    fn test_sa_max_iterations_limit() {
        let config = SaConfig::default()
            .with_initial_temperature(1e10)
            .with_min_temperature(1e-15)
            .with_iterations_per_temperature(10)
            .with_max_iterations(100)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        assert_eq!(result.iterations, 100);
        assert_eq!(result.termination, Termination::IterationLimit);
    }

    #[test]
    fn test_sa_cancellation() {
        let config = SaConfig::default()
            .with_initial_temperature(1e10)
            .with_min_temperature(1e-15)
            .with_seed(42);

        // Raised before running so cancellation is deterministic.
        let cancel = Arc::new(AtomicBool::new(true));

        let result = SaRunner::run_with_cancel(&QuadraticProblem, &config, Some(cancel)).unwrap();
        assert!(result.cancelled());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_sa_time_limit() {
        let config = SaConfig::default()
            .with_initial_temperature(1e10)
            .with_min_temperature(1e-15)
            .with_alpha(0.999_999)
            .with_max_time(Duration::ZERO)
            .with_seed(7);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();
        assert_eq!(result.termination, Termination::TimeLimit);
    }

    #[test]
    fn test_sa_cost_history_non_increasing() {
        let config = SaConfig::default()
            .with_initial_temperature(50.0)
            .with_min_temperature(0.01)
            .with_iterations_per_temperature(100)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        assert!(result.cost_history.len() > 1);
        for window in result.cost_history.windows(2) {
            assert!(
                window[1] <= window[0],
                "best cost history should be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
        assert_eq!(result.cost_history.last().copied(), Some(result.best_cost));
    }

    // ---- Discrete: permutation sorting with a known optimum ----

    struct PermSortProblem {
        n: usize,
    }

    impl SaProblem for PermSortProblem {
        type Solution = Vec<usize>;

        fn initial_solution<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
            let mut perm: Vec<usize> = (0..self.n).collect();
            u_numflow::random::shuffle(&mut perm, rng);
            perm
        }

        fn cost(&self, perm: &Vec<usize>) -> f64 {
            perm.iter().enumerate().filter(|&(i, &v)| i != v).count() as f64
        }

        fn neighbor<R: Rng>(&self, perm: &Vec<usize>, rng: &mut R) -> Vec<usize> {
            let mut new = perm.clone();
            let i = rng.random_range(0..self.n);
            let j = rng.random_range(0..self.n);
            new.swap(i, j);
            new
        }

        fn target_cost(&self) -> Option<f64> {
            Some(0.0)
        }
    }

    #[test]
    fn test_sa_stops_at_target() {
        let problem = PermSortProblem { n: 6 };
        let config = SaConfig::default()
            .with_initial_temperature(5.0)
            .with_min_temperature(1e-6)
            .with_alpha(0.99)
            .with_iterations_per_temperature(200)
            .with_seed(42);

        let result = SaRunner::run(&problem, &config).unwrap();

        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.best, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.best_cost, 0.0);
    }

    #[test]
    fn test_sa_non_improving_limit() {
        struct Flat;
        impl SaProblem for Flat {
            type Solution = ();
            fn initial_solution<R: Rng>(&self, _rng: &mut R) {}
            fn cost(&self, _: &()) -> f64 {
                1.0
            }
            fn neighbor<R: Rng>(&self, _: &(), _rng: &mut R) {}
        }

        let config = SaConfig::default().with_max_non_improving(25).with_seed(1);
        let result = SaRunner::run(&Flat, &config).unwrap();
        assert_eq!(result.termination, Termination::NonImproving);
        assert_eq!(result.iterations, 25);
        assert_eq!(result.cost_history, vec![1.0]);
    }

    #[test]
    fn test_sa_metropolis_accepts_uphill() {
        // At very high temperature, almost all moves should be accepted
        let config = SaConfig::default()
            .with_initial_temperature(1e8)
            .with_min_temperature(1e7)
            .with_alpha(0.99)
            .with_iterations_per_temperature(1000)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        let acceptance_ratio = result.accepted_moves as f64 / result.iterations as f64;
        assert!(
            acceptance_ratio > 0.8,
            "expected high acceptance at high temp, got {acceptance_ratio}"
        );
    }
}
