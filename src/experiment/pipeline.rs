//! Standard learning experiment: generate data, fit, evaluate.
//!
//! Each experiment is five tasks:
//!
//! ```text
//! alternatives ──┐
//!                ├─> comparisons ─> fit ─> test
//! ground truth ──┘
//! ```
//!
//! All artifacts are files under one output directory, named by the
//! helpers of [`ExperimentPaths`]. Fit and test outcomes are appended to
//! `fit_results.csv` and `test_results.csv`.

use super::executor::{ExecutionReport, Executor, Task};
use super::graph::TaskGraph;
use super::writer::{ResultRow, ResultSender, ResultWriter, RESULT_HEADER};
use crate::error::{Result, SrmpError};
use crate::generate;
use crate::learn::{SaLearner, SaLearnerConfig};
use crate::mip::{MipConfig, MipLearner};
use crate::model::{ModelKind, SrmpModel};
use crate::relations::PreferenceStructure;
use crate::table::NormalTable;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use u_numflow::random::create_rng;

/// File name of the fit result log.
pub const FIT_RESULTS: &str = "fit_results.csv";
/// File name of the test result log.
pub const TEST_RESULTS: &str = "test_results.csv";

/// Learner used by one experiment.
#[derive(Debug, Clone)]
pub enum Learner {
    Mip(MipConfig),
    Sa(SaLearnerConfig),
}

impl Learner {
    pub fn name(&self) -> &'static str {
        match self {
            Learner::Mip(_) => "mip",
            Learner::Sa(_) => "sa",
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Learner::Mip(config) => config.validate(),
            Learner::Sa(config) => config.validate(),
        }
    }
}

/// Parameters of one experiment.
#[derive(Debug, Clone)]
pub struct ExperimentSpec {
    /// Base seed; each stage derives its own generator from it.
    pub seed: u64,
    pub n_alternatives: usize,
    pub n_criteria: usize,
    /// Size of the held-out table used for evaluation.
    pub n_test: usize,
    pub truth_kind: ModelKind,
    pub truth_profiles: usize,
    pub n_comparisons: usize,
    /// Probability of flipping each generated preference.
    pub noise: f64,
    pub learner: Learner,
}

impl Default for ExperimentSpec {
    fn default() -> Self {
        Self {
            seed: 0,
            n_alternatives: 20,
            n_criteria: 3,
            n_test: 50,
            truth_kind: ModelKind::Srmp,
            truth_profiles: 1,
            n_comparisons: 30,
            noise: 0.0,
            learner: Learner::Sa(SaLearnerConfig::default()),
        }
    }
}

impl ExperimentSpec {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_alternatives < 2 {
            return Err("n_alternatives must be at least 2".into());
        }
        if self.n_test < 2 {
            return Err("n_test must be at least 2".into());
        }
        if self.n_criteria == 0 {
            return Err("n_criteria must be positive".into());
        }
        if self.n_comparisons == 0 {
            return Err("n_comparisons must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.noise) {
            return Err(format!("noise must be in [0, 1], got {}", self.noise));
        }
        self.learner.validate()
    }
}

/// Stages of one experiment, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Alternatives,
    GroundTruth,
    Comparisons,
    Fit,
    Test,
}

impl Stage {
    fn seed_offset(self) -> u64 {
        self as u64
    }
}

/// Task key: experiment index and stage.
pub type TaskKey = (usize, Stage);

/// Artifact locations of one experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentPaths {
    pub alternatives: PathBuf,
    pub test_alternatives: PathBuf,
    pub ground_truth: PathBuf,
    pub comparisons: PathBuf,
    pub model: PathBuf,
    /// Written instead of `model` when fitting finds nothing.
    pub failure: PathBuf,
}

impl ExperimentPaths {
    pub fn new(dir: &Path, id: usize, learner: &str) -> Self {
        Self {
            alternatives: dir.join(format!("A_{id}.csv")),
            test_alternatives: dir.join(format!("A_{id}_test.csv")),
            ground_truth: dir.join(format!("truth_{id}.json")),
            comparisons: dir.join(format!("D_{id}.csv")),
            model: dir.join(format!("model_{id}_{learner}.json")),
            failure: dir.join(format!("model_{id}_{learner}.failed")),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of one fit, independent of the learner.
struct Fitted {
    model: Option<SrmpModel>,
    fitness: f64,
    k: usize,
    iterations: Option<usize>,
}

/// Runs `learner` on training data, the way the CLI does.
fn fit_with(learner: &Learner, table: &NormalTable, d: &PreferenceStructure) -> Result<Fitted> {
    match learner {
        Learner::Mip(config) => {
            let result = MipLearner::fit(table, d, config)?;
            Ok(Fitted {
                k: result.profiles,
                model: result.model,
                fitness: result.fitness,
                iterations: None,
            })
        }
        Learner::Sa(config) => {
            let result = SaLearner::fit(table, d, config)?;
            Ok(Fitted {
                k: config.profiles,
                model: Some(result.model),
                fitness: result.fitness,
                iterations: Some(result.iterations),
            })
        }
    }
}

/// Writes the learned model, or a failure marker, and logs a result row.
///
/// Returns the model, `None` when the learner found none.
pub fn fit_and_record(
    learner: &Learner,
    alternatives: &Path,
    comparisons: &Path,
    model_path: &Path,
    failure_path: &Path,
    results: &ResultSender,
) -> Result<Option<SrmpModel>> {
    let table = NormalTable::read_csv(alternatives)?;
    let d = PreferenceStructure::read_csv(comparisons)?;
    let started = Instant::now();
    let fitted = fit_with(learner, &table, &d)?;
    let elapsed = started.elapsed();
    match &fitted.model {
        Some(model) => model.save_json(model_path)?,
        None => fs::write(failure_path, "no model found\n")?,
    }
    results.send_row(&ResultRow {
        alternatives_file: file_label(alternatives),
        comparisons_file: file_label(comparisons),
        k: fitted.k,
        elapsed,
        iterations: fitted.iterations,
        fitness: fitted.fitness,
    })?;
    Ok(fitted.model)
}

/// Share of the truth's test-set structure reproduced by `model`.
pub fn test_fitness(model: &SrmpModel, truth: &SrmpModel, table: &NormalTable) -> Result<f64> {
    let expected = truth.rank(table)?.to_preference_structure();
    model.rank(table)?.fitness(&expected)
}

fn stage_tasks(
    id: usize,
    spec: &ExperimentSpec,
    paths: &ExperimentPaths,
    fit_results: &ResultSender,
    test_results: &ResultSender,
) -> Vec<(TaskKey, Task)> {
    let rng_for = |stage: Stage| create_rng(spec.seed.wrapping_mul(8).wrapping_add(stage.seed_offset()));

    let alternatives: Task = {
        let (spec, paths) = (spec.clone(), paths.clone());
        let mut rng = rng_for(Stage::Alternatives);
        Box::new(move || {
            generate::random_table(spec.n_alternatives, spec.n_criteria, &mut rng)?
                .write_csv(&paths.alternatives)?;
            generate::random_table(spec.n_test, spec.n_criteria, &mut rng)?
                .write_csv(&paths.test_alternatives)
        })
    };

    let ground_truth: Task = {
        let (spec, paths) = (spec.clone(), paths.clone());
        let mut rng = rng_for(Stage::GroundTruth);
        Box::new(move || {
            generate::random_model(spec.truth_kind, spec.truth_profiles, spec.n_criteria, &mut rng)?
                .save_json(&paths.ground_truth)
        })
    };

    let comparisons: Task = {
        let (spec, paths) = (spec.clone(), paths.clone());
        let mut rng = rng_for(Stage::Comparisons);
        Box::new(move || {
            let table = NormalTable::read_csv(&paths.alternatives)?;
            let truth = SrmpModel::load_json(&paths.ground_truth)?;
            let ranking = truth.rank(&table)?;
            generate::comparisons(&ranking, spec.n_comparisons, spec.noise, &mut rng)?
                .write_csv(&paths.comparisons)
        })
    };

    let fit: Task = {
        let (learner, paths) = (spec.learner.clone(), paths.clone());
        let results = fit_results.clone();
        Box::new(move || {
            fit_and_record(
                &learner,
                &paths.alternatives,
                &paths.comparisons,
                &paths.model,
                &paths.failure,
                &results,
            )?
            .map(|_| ())
            .ok_or_else(|| SrmpError::InvalidModel(format!("experiment {id}: no model found")))
        })
    };

    let test: Task = {
        let paths = paths.clone();
        let results = test_results.clone();
        Box::new(move || {
            let table = NormalTable::read_csv(&paths.test_alternatives)?;
            let truth = SrmpModel::load_json(&paths.ground_truth)?;
            let model = SrmpModel::load_json(&paths.model)?;
            let started = Instant::now();
            let fitness = test_fitness(&model, &truth, &table)?;
            results.send_row(&ResultRow {
                alternatives_file: file_label(&paths.test_alternatives),
                comparisons_file: file_label(&paths.ground_truth),
                k: model.k(),
                elapsed: started.elapsed(),
                iterations: None,
                fitness,
            })
        })
    };

    vec![
        ((id, Stage::Alternatives), alternatives),
        ((id, Stage::GroundTruth), ground_truth),
        ((id, Stage::Comparisons), comparisons),
        ((id, Stage::Fit), fit),
        ((id, Stage::Test), test),
    ]
}

fn stage_edges(id: usize) -> [(TaskKey, TaskKey); 4] {
    [
        ((id, Stage::Alternatives), (id, Stage::Comparisons)),
        ((id, Stage::GroundTruth), (id, Stage::Comparisons)),
        ((id, Stage::Comparisons), (id, Stage::Fit)),
        ((id, Stage::Fit), (id, Stage::Test)),
    ]
}

/// Runs every experiment of `specs` on `workers` threads.
///
/// Artifacts land in `out_dir`, which is created if missing. A failed
/// stage stops only its own experiment.
pub fn run_experiments(
    specs: &[ExperimentSpec],
    out_dir: impl AsRef<Path>,
    workers: usize,
) -> Result<ExecutionReport<TaskKey>> {
    for (id, spec) in specs.iter().enumerate() {
        spec.validate()
            .map_err(|msg| SrmpError::InvalidConfig(format!("experiment {id}: {msg}")))?;
    }
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;

    let fit_writer = ResultWriter::open(out_dir.join(FIT_RESULTS), Some(RESULT_HEADER))?;
    let test_writer = ResultWriter::open(out_dir.join(TEST_RESULTS), Some(RESULT_HEADER))?;
    let (fit_results, test_results) = (fit_writer.sender(), test_writer.sender());

    let mut graph = TaskGraph::new();
    let mut tasks = BTreeMap::new();
    for (id, spec) in specs.iter().enumerate() {
        let paths = ExperimentPaths::new(out_dir, id, spec.learner.name());
        for (key, task) in stage_tasks(id, spec, &paths, &fit_results, &test_results) {
            graph.add_task(key);
            tasks.insert(key, task);
        }
        for (prerequisite, task) in stage_edges(id) {
            graph.add_dependency(&task, &prerequisite)?;
        }
    }
    drop((fit_results, test_results));

    let report = Executor::new(workers).run(&graph, tasks)?;
    let fits = fit_writer.finish()?;
    let tests = test_writer.finish()?;
    info!(
        experiments = specs.len(),
        completed = report.completed.len(),
        failed = report.failed.len(),
        fits,
        tests,
        "experiments finished"
    );
    Ok(report)
}
