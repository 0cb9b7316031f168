//! Parallel experiment orchestration.
//!
//! Experiments are expressed as a [`TaskGraph`] of file-producing tasks
//! and run by an [`Executor`] on local worker threads. Results are logged
//! through [`ResultWriter`]s, one writer thread per CSV file.
//!
//! [`run_experiments`] wires the standard generate / fit / evaluate
//! pipeline.

mod executor;
mod graph;
mod pipeline;
mod writer;

pub use executor::{ExecutionReport, Executor, Task};
pub use graph::TaskGraph;
pub use pipeline::{
    fit_and_record, run_experiments, test_fitness, ExperimentPaths, ExperimentSpec, Learner, Stage,
    TaskKey, FIT_RESULTS, TEST_RESULTS,
};
pub use writer::{ResultRow, ResultSender, ResultWriter, RESULT_HEADER};
