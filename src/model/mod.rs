//! SRMP/RMP models and the ranking rule.
//!
//! A model ranks alternatives by comparing each of them with `k`
//! reference profiles. Per profile, an alternative's strength is the value
//! of the coalition of criteria on which it meets the profile; profiles
//! are consulted in lexicographic order until one separates two
//! alternatives.
//!
//! # Key Components
//!
//! - [`SrmpModel`]: profiles + importance + lexicographic order, with
//!   [`SrmpModel::rank`]
//! - [`CoalitionValue`]: the single point where SRMP (additive
//!   [`Weights`]) and RMP (monotone [`PowerSet`] capacities) differ
//! - [`outranking`]: profile-wise outranking matrices and their
//!   lexicographic aggregation
//!
//! # References
//!
//! Rolland (2013), "Reference-based preferences aggregation procedures in
//! multi-criteria decision making", EJOR 225(3).

mod capacity;
mod importance;
mod json;
pub mod outranking;
mod srmp;

pub use capacity::{PowerSet, MAX_CAPACITY_CRITERIA};
pub use importance::{Coalition, CoalitionValue, Importance, Weights, MAX_CRITERIA};
pub use json::parse_coalition;
pub use srmp::{ModelKind, SrmpModel, MAX_PROFILES};
pub(crate) use srmp::check_permutation;
