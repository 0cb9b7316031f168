//! Simulated-annealing learner for SRMP/RMP models.
//!
//! Fits a model with a fixed number of profiles to pairwise comparisons by
//! annealing over models. The search starts from a balanced model and
//! applies one of four moves per iteration:
//!
//! - shift one profile coordinate to an adjacent candidate level
//! - transfer weight between two criteria (SRMP)
//! - step one capacity by 1 inside its monotone envelope (RMP)
//! - swap two adjacent profiles in the lexicographic order
//!
//! Learning never fails on valid input: the best model found is returned
//! together with its fitness, which may be below 1.

mod problem;

use crate::error::{Result, SrmpError};
use crate::model::{ModelKind, SrmpModel, MAX_PROFILES};
use crate::relations::PreferenceStructure;
use crate::sa::{SaConfig, SaRunner, Termination};
use crate::table::NormalTable;
use problem::FitProblem;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Configuration of the annealing learner.
///
/// # Examples
///
/// ```
/// use u_srmp::learn::SaLearnerConfig;
/// use u_srmp::model::ModelKind;
///
/// let config = SaLearnerConfig::default()
///     .with_profiles(2)
///     .with_kind(ModelKind::Rmp)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SaLearnerConfig {
    /// Number of profiles `k` of the learned model.
    pub profiles: usize,

    pub kind: ModelKind,

    /// Largest share of a weight moved by one transfer.
    pub weight_step: f64,

    /// Annealing schedule and budgets.
    pub annealing: SaConfig,
}

impl Default for SaLearnerConfig {
    fn default() -> Self {
        Self {
            profiles: 1,
            kind: ModelKind::Srmp,
            weight_step: 0.1,
            annealing: SaConfig::default()
                .with_initial_temperature(0.5)
                .with_min_temperature(1e-4)
                .with_alpha(0.99)
                .with_iterations_per_temperature(50),
        }
    }
}

impl SaLearnerConfig {
    pub fn with_profiles(mut self, k: usize) -> Self {
        self.profiles = k;
        self
    }

    pub fn with_kind(mut self, kind: ModelKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_weight_step(mut self, step: f64) -> Self {
        self.weight_step = step;
        self
    }

    pub fn with_annealing(mut self, annealing: SaConfig) -> Self {
        self.annealing = annealing;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.annealing.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.profiles == 0 || self.profiles > MAX_PROFILES {
            return Err(format!(
                "profiles must be in 1..={MAX_PROFILES}, got {}",
                self.profiles
            ));
        }
        if !(self.weight_step > 0.0 && self.weight_step <= 1.0) {
            return Err(format!("weight_step must be in (0, 1], got {}", self.weight_step));
        }
        self.annealing.validate()
    }
}

/// Outcome of one annealing fit.
#[derive(Debug, Clone)]
pub struct SaLearnResult {
    /// Best model found.
    pub model: SrmpModel,

    /// Fitness of `model` on the training comparisons.
    pub fitness: f64,

    pub iterations: usize,

    pub termination: Termination,

    /// Best fitness after each improvement (non-decreasing).
    pub fitness_history: Vec<f64>,

    pub elapsed: Duration,
}

/// Fits SRMP/RMP models by simulated annealing.
pub struct SaLearner;

impl SaLearner {
    /// Fits a model to `comparisons` over the alternatives of `table`.
    pub fn fit(
        table: &NormalTable,
        comparisons: &PreferenceStructure,
        config: &SaLearnerConfig,
    ) -> Result<SaLearnResult> {
        Self::fit_with_cancel(table, comparisons, config, None)
    }

    /// Same as [`SaLearner::fit`], stopping early when `cancel` is raised.
    pub fn fit_with_cancel(
        table: &NormalTable,
        comparisons: &PreferenceStructure,
        config: &SaLearnerConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SaLearnResult> {
        config.validate().map_err(SrmpError::InvalidConfig)?;
        check_training_set(table, comparisons)?;

        let started = Instant::now();
        let problem = FitProblem::new(
            table,
            comparisons,
            config.kind,
            config.profiles,
            config.weight_step,
        )?;
        let result = SaRunner::run_with_cancel(&problem, &config.annealing, cancel)
            .map_err(SrmpError::InvalidConfig)?;
        let fitness = 1.0 - result.best_cost;
        let elapsed = started.elapsed();
        info!(
            k = config.profiles,
            kind = ?config.kind,
            fitness,
            iterations = result.iterations,
            termination = ?result.termination,
            elapsed_ms = elapsed.as_millis() as u64,
            "annealing fit finished"
        );
        Ok(SaLearnResult {
            model: result.best,
            fitness,
            iterations: result.iterations,
            termination: result.termination,
            fitness_history: result.cost_history.iter().map(|c| 1.0 - c).collect(),
            elapsed,
        })
    }
}

/// Rejects training sets the learners cannot work on.
pub(crate) fn check_training_set(
    table: &NormalTable,
    comparisons: &PreferenceStructure,
) -> Result<()> {
    if comparisons.is_empty() {
        return Err(SrmpError::EmptyComparisons);
    }
    if table.n_criteria() == 0 {
        return Err(SrmpError::ShapeMismatch("table has no criteria".into()));
    }
    if let Some(&a) = comparisons.elements().iter().find(|&&a| a >= table.len()) {
        return Err(SrmpError::ShapeMismatch(format!(
            "comparison mentions alternative {a}, table has {}",
            table.len()
        )));
    }
    Ok(())
}
