//! Error taxonomy shared by every module of the crate.
//!
//! Domain and validation failures are raised where a value is built or
//! used. Solver infeasibility and annealing non-convergence are not
//! errors: the learners recover from them locally.

use thiserror::Error;

/// Errors raised by scales, tables, relations, models and their codecs.
#[derive(Debug, Error)]
pub enum SrmpError {
    /// A value does not belong to the scale it is evaluated on.
    #[error("value `{value}` is outside scale {scale}")]
    OutOfScale { value: String, scale: String },

    /// Two scale kinds cannot be converted into one another.
    #[error("cannot transform from {from} scale to {to} scale")]
    IncompatibleScales { from: String, to: String },

    /// A scale or label definition is malformed.
    #[error("invalid scale: {0}")]
    InvalidScale(String),

    /// Duplicate alternative, criterion or scale label.
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),

    /// Dimensions of two collaborating objects disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The lexicographic order is not a permutation of profile indices.
    #[error("invalid lexicographic order {order:?} for {profiles} profiles")]
    InvalidLexicographicOrder { order: Vec<usize>, profiles: usize },

    /// Model parameters are malformed (weights, profiles).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A capacity write would break monotonicity or the empty-set rule.
    #[error("capacity of {subset} = {value} is rejected: {reason}")]
    CapacityViolation {
        subset: String,
        value: f64,
        reason: String,
    },

    /// A relation conflicts with one already held for the same pair.
    #[error("relation {new} conflicts with existing {existing}")]
    IncompatibleRelation { new: String, existing: String },

    /// An operation needs a total preorder but got something weaker.
    #[error("preference structure is not a total preorder")]
    NotTotalPreorder,

    /// Fitness is undefined without comparisons.
    #[error("fitness is undefined on an empty comparison set")]
    EmptyComparisons,

    /// Text could not be parsed (CSV or JSON syntax).
    #[error("parse error: {0}")]
    Parse(String),

    /// A learner or executor configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A task graph references unknown tasks or contains a cycle.
    #[error("invalid task graph: {0}")]
    InvalidTaskGraph(String),

    /// A task body panicked on a worker thread.
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// Parsed JSON does not describe a valid object.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SrmpError {
    fn from(err: serde_json::Error) -> Self {
        SrmpError::Parse(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SrmpError>;
