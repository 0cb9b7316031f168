//! `srmp`: generate SRMP datasets, learn models and run experiments.
//!
//! **Usage:**
//! ```text
//! srmp generate-table --alternatives 20 --criteria 3 --seed 1 -o A.csv
//! srmp generate-model --profiles 2 --criteria 3 -o truth.json
//! srmp generate-comparisons --model truth.json --table A.csv --count 30 -o D.csv
//! srmp learn-sa --table A.csv --comparisons D.csv --profiles 2 -o model.json
//! srmp test --model model.json --truth truth.json --table A_test.csv
//! srmp experiment --out runs --count 10 --learner mip
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `u_srmp=info`).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use u_numflow::random::create_rng;
use u_srmp::experiment::{
    fit_and_record, run_experiments, test_fitness, ExperimentSpec, Learner, ResultWriter,
    RESULT_HEADER,
};
use u_srmp::generate;
use u_srmp::learn::SaLearnerConfig;
use u_srmp::mip::{MipConfig, ProfileCount};
use u_srmp::model::{ModelKind, SrmpModel};
use u_srmp::relations::PreferenceStructure;
use u_srmp::sa::SaConfig;
use u_srmp::table::NormalTable;

#[derive(Parser)]
#[command(name = "srmp", version, about = "SRMP preference models: generation, learning and evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Random normal performance table.
    GenerateTable {
        #[arg(long)]
        alternatives: usize,
        #[arg(long)]
        criteria: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Random SRMP or RMP model.
    GenerateModel {
        #[arg(long, value_enum, default_value_t = KindArg::Srmp)]
        kind: KindArg,
        #[arg(long, default_value_t = 1)]
        profiles: usize,
        #[arg(long)]
        criteria: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Pairwise comparisons labelled by a model's ranking of a table.
    GenerateComparisons {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        count: usize,
        /// Probability of flipping each preference.
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Exact learner (SRMP weights).
    LearnMip {
        #[command(flatten)]
        io: LearnIo,
        #[command(flatten)]
        mip: MipArgs,
    },
    /// Simulated-annealing learner (SRMP or RMP).
    LearnSa {
        #[command(flatten)]
        io: LearnIo,
        #[command(flatten)]
        sa: SaArgs,
    },
    /// Print the ranking of a table by a model.
    Rank {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        table: PathBuf,
    },
    /// Fitness of a model against comparisons or a reference model.
    Test {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        table: PathBuf,
        /// Reference model whose ranking of `table` is the target.
        #[arg(long, conflicts_with = "comparisons")]
        truth: Option<PathBuf>,
        #[arg(long)]
        comparisons: Option<PathBuf>,
    },
    /// Batch of generate / fit / test experiments on a worker pool.
    Experiment(ExperimentArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Srmp,
    Rmp,
}

impl From<KindArg> for ModelKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Srmp => ModelKind::Srmp,
            KindArg::Rmp => ModelKind::Rmp,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LearnerArg {
    Mip,
    Sa,
}

#[derive(Args)]
struct LearnIo {
    #[arg(long)]
    table: PathBuf,
    #[arg(long)]
    comparisons: PathBuf,
    /// Learned model JSON; `<output>.failed` is written when no model is found.
    #[arg(short, long)]
    output: PathBuf,
    /// CSV file receiving one result row.
    #[arg(long, default_value = "results.csv")]
    results: PathBuf,
}

#[derive(Args)]
struct MipArgs {
    /// Exact number of profiles.
    #[arg(long, default_value_t = 1)]
    profiles: usize,
    /// Try 1..=N profiles instead of exactly `--profiles`.
    #[arg(long)]
    max_profiles: Option<usize>,
    /// Fixed lexicographic order, e.g. `1,0`.
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<usize>>,
    #[arg(long, default_value_t = 1e-3)]
    gamma: f64,
    /// Require every comparison to be reproduced.
    #[arg(long)]
    strict: bool,
}

impl MipArgs {
    fn config(&self) -> MipConfig {
        let profiles = match self.max_profiles {
            Some(max) => ProfileCount::Max(max),
            None => ProfileCount::Exact(self.profiles),
        };
        let config = MipConfig::default()
            .with_gamma(self.gamma)
            .with_inconsistencies(!self.strict)
            .with_profiles(profiles);
        match &self.order {
            Some(order) => config.with_lexicographic_order(order.clone()),
            None => config,
        }
    }
}

#[derive(Args)]
struct SaArgs {
    #[arg(long, default_value_t = 1)]
    profiles: usize,
    #[arg(long, value_enum, default_value_t = KindArg::Srmp)]
    kind: KindArg,
    #[arg(long, default_value_t = 0.1)]
    weight_step: f64,
    #[arg(long, default_value_t = 0.5)]
    initial_temperature: f64,
    #[arg(long, default_value_t = 0.99)]
    alpha: f64,
    #[arg(long, default_value_t = 0)]
    max_iterations: usize,
    /// Wall-clock budget in seconds.
    #[arg(long)]
    max_time: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
}

impl SaArgs {
    fn config(&self) -> Result<SaLearnerConfig> {
        let mut annealing = SaConfig::default()
            .with_min_temperature(1e-4)
            .with_iterations_per_temperature(50)
            .with_initial_temperature(self.initial_temperature)
            .with_alpha(self.alpha)
            .with_max_iterations(self.max_iterations);
        if let Some(secs) = self.max_time {
            let budget = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid --max-time {secs}"))?;
            annealing = annealing.with_max_time(budget);
        }
        if let Some(seed) = self.seed {
            annealing = annealing.with_seed(seed);
        }
        Ok(SaLearnerConfig::default()
            .with_profiles(self.profiles)
            .with_kind(self.kind.into())
            .with_weight_step(self.weight_step)
            .with_annealing(annealing))
    }
}

#[derive(Args)]
struct ExperimentArgs {
    #[arg(long)]
    out: PathBuf,
    /// Number of experiments; experiment `i` uses seed `seed + i`.
    #[arg(long, default_value_t = 1)]
    count: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long, default_value_t = 20)]
    alternatives: usize,
    #[arg(long, default_value_t = 3)]
    criteria: usize,
    #[arg(long, default_value_t = 50)]
    test_alternatives: usize,
    #[arg(long, value_enum, default_value_t = KindArg::Srmp)]
    truth_kind: KindArg,
    #[arg(long, default_value_t = 1)]
    truth_profiles: usize,
    #[arg(long, default_value_t = 30)]
    comparisons: usize,
    #[arg(long, default_value_t = 0.0)]
    noise: f64,
    #[arg(long, value_enum, default_value_t = LearnerArg::Sa)]
    learner: LearnerArg,
    /// Profiles of the learned models.
    #[arg(long, default_value_t = 1)]
    profiles: usize,
    /// Exact learner: require every comparison to be reproduced.
    #[arg(long)]
    strict: bool,
    /// Annealing learner: iteration budget per fit (0 = until cooled).
    #[arg(long, default_value_t = 0)]
    max_iterations: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("u_srmp=info,srmp=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::GenerateTable {
            alternatives,
            criteria,
            seed,
            output,
        } => {
            let mut rng = create_rng(seed);
            generate::random_table(alternatives, criteria, &mut rng)?.write_csv(&output)?;
            info!(path = %output.display(), "table written");
        }
        Command::GenerateModel {
            kind,
            profiles,
            criteria,
            seed,
            output,
        } => {
            let mut rng = create_rng(seed);
            generate::random_model(kind.into(), profiles, criteria, &mut rng)?.save_json(&output)?;
            info!(path = %output.display(), "model written");
        }
        Command::GenerateComparisons {
            model,
            table,
            count,
            noise,
            seed,
            output,
        } => {
            let model = load_model(&model)?;
            let table = load_table(&table)?;
            let mut rng = create_rng(seed);
            generate::comparisons(&model.rank(&table)?, count, noise, &mut rng)?.write_csv(&output)?;
            info!(path = %output.display(), "comparisons written");
        }
        Command::LearnMip { io, mip } => learn(&io, &Learner::Mip(mip.config()))?,
        Command::LearnSa { io, sa } => learn(&io, &Learner::Sa(sa.config()?))?,
        Command::Rank { model, table } => {
            let model = load_model(&model)?;
            let table = load_table(&table)?;
            let ranking = model.rank(&table)?;
            for (alternative, rank) in ranking.iter() {
                println!("{},{rank}", table.alternatives()[alternative]);
            }
        }
        Command::Test {
            model,
            table,
            truth,
            comparisons,
        } => {
            let model = load_model(&model)?;
            let table = load_table(&table)?;
            let fitness = match (truth, comparisons) {
                (Some(truth), _) => test_fitness(&model, &load_model(&truth)?, &table)?,
                (None, Some(path)) => {
                    let d = PreferenceStructure::read_csv(&path)
                        .with_context(|| format!("reading comparisons {}", path.display()))?;
                    model.fitness(&table, &d)?
                }
                (None, None) => bail!("one of --truth or --comparisons is required"),
            };
            println!("{fitness}");
        }
        Command::Experiment(args) => experiment(args)?,
    }
    Ok(())
}

fn load_model(path: &Path) -> Result<SrmpModel> {
    SrmpModel::load_json(path).with_context(|| format!("loading model {}", path.display()))
}

fn load_table(path: &Path) -> Result<NormalTable> {
    NormalTable::read_csv(path).with_context(|| format!("reading table {}", path.display()))
}

fn learn(io: &LearnIo, learner: &Learner) -> Result<()> {
    let writer = ResultWriter::open(&io.results, Some(RESULT_HEADER))
        .with_context(|| format!("opening {}", io.results.display()))?;
    let failure = io.output.with_extension("failed");
    let model = fit_and_record(
        learner,
        &io.table,
        &io.comparisons,
        &io.output,
        &failure,
        &writer.sender(),
    )?;
    if let Err(err) = writer.finish() {
        warn!(error = %err, "result row not written");
    }
    match model {
        Some(model) => {
            info!(path = %io.output.display(), profiles = model.k(), "model written");
            Ok(())
        }
        None => bail!("no model found; marker written to {}", failure.display()),
    }
}

fn experiment(args: ExperimentArgs) -> Result<()> {
    let specs: Vec<ExperimentSpec> = (0..args.count as u64)
        .map(|i| {
            let seed = args.seed.wrapping_add(i);
            let learner = match args.learner {
                LearnerArg::Mip => Learner::Mip(
                    MipConfig::default()
                        .with_profiles(ProfileCount::Exact(args.profiles))
                        .with_inconsistencies(!args.strict),
                ),
                LearnerArg::Sa => {
                    let defaults = SaLearnerConfig::default();
                    let annealing = defaults.annealing.clone().with_max_iterations(args.max_iterations);
                    Learner::Sa(
                        defaults
                            .with_profiles(args.profiles)
                            .with_annealing(annealing)
                            .with_seed(seed),
                    )
                }
            };
            ExperimentSpec {
                seed,
                n_alternatives: args.alternatives,
                n_criteria: args.criteria,
                n_test: args.test_alternatives,
                truth_kind: args.truth_kind.into(),
                truth_profiles: args.truth_profiles,
                n_comparisons: args.comparisons,
                noise: args.noise,
                learner,
            }
        })
        .collect();
    let workers = args
        .workers
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));
    let report = run_experiments(&specs, &args.out, workers)?;
    for (key, message) in &report.failed {
        warn!(task = ?key, %message, "experiment task failed");
    }
    println!(
        "{} tasks completed, {} failed, {} never run",
        report.completed.len(),
        report.failed.len(),
        report.never_run.len()
    );
    if !report.is_success() {
        bail!("some experiments did not finish");
    }
    Ok(())
}
