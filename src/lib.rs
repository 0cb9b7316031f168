//! Preference learning with SRMP and RMP ranking models.
//!
//! Implements the SRMP (Simple Ranking Method using Reference Profiles)
//! ranking rule and its capacity-based generalization RMP, plus two
//! learners that fit a model to pairwise comparisons:
//!
//! - **Scales & tables**: [`scale`] and [`table`] hold performances on
//!   nominal, quantitative, qualitative and fuzzy scales, normalized to
//!   `[0, 1]` for learning.
//! - **Relations**: [`relations`] holds preference structures, outranking
//!   matrices and rankings.
//! - **Models**: [`model`] holds SRMP/RMP models and the ranking rule.
//! - **MIP learner**: [`mip`] fits a model exactly by solving one
//!   mixed-integer program per lexicographic order.
//! - **SA learner**: [`learn`] fits a model with simulated annealing on
//!   top of the generic [`sa`] engine.
//! - **Experiments**: [`generate`] draws synthetic data; [`experiment`]
//!   runs task graphs on a local worker pool and logs CSV results.
//!
//! # Architecture
//!
//! All learning happens on normal tables (every criterion on `[0, 1]`,
//! higher is better). Ranking and both learners are synchronous and
//! single-threaded; only the experiment executor spawns threads.

pub mod error;
pub mod experiment;
pub mod generate;
pub mod learn;
pub mod mip;
pub mod model;
pub mod relations;
pub mod sa;
pub mod scale;
pub mod table;

pub use error::{Result, SrmpError};
