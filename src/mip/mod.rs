//! Exact SRMP learning by mixed-integer programming.
//!
//! For every candidate lexicographic order (all permutations of the
//! profiles unless one is fixed) a MILP is solved whose optimum is an
//! SRMP model reproducing as many comparisons as possible. The search
//! over orders, and optionally over the number of profiles, stops at the
//! first perfect fit.
//!
//! # Key Components
//!
//! - [`MipConfig`]: margin `gamma`, tolerance of inconsistent data,
//!   [`ProfileCount`], optional fixed order
//! - [`solve_order`]: the program for one order, solved with `good_lp`
//!   on the pure-Rust `microlp` backend
//! - [`MipLearner`]: order and profile-count search
//!
//! Only additive weights are learned here; capacities (RMP) are learned
//! by [`crate::learn`].

mod config;
mod formulation;
mod runner;

pub use config::{MipConfig, ProfileCount};
pub use formulation::{solve_order, OrderSolution, SolverStatus};
pub use runner::{MipLearner, MipResult};
