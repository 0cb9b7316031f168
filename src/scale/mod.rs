//! Scales and value transforms.
//!
//! A [`Scale`] describes the domain of one criterion. Every scale except
//! [`NominalScale`] can be mapped onto the normal scale `[0, 1]` (MAX),
//! which is where the ranking rule and the learners operate.
//!
//! # Key Components
//!
//! - [`Value`]: a single performance (number or label)
//! - [`QuantitativeScale`]: numeric interval with a preference direction
//! - [`QualitativeScale`]: labels layered over a numeric scale
//! - [`FuzzyScale`]: qualitative scale with trapezoidal fuzzy numbers
//! - [`NominalScale`]: unordered labels

mod qualitative;
mod quantitative;

pub use qualitative::{FuzzyNumber, FuzzyScale, NominalScale, QualitativeScale};
pub use quantitative::{PreferenceDirection, QuantitativeScale};

use crate::error::{Result, SrmpError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single performance value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Label(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            Value::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Label(l) => Some(l),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<&str> for Value {
    fn from(l: &str) -> Self {
        Value::Label(l.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(x) => write!(f, "{x}"),
            Value::Label(l) => f.write_str(l),
        }
    }
}

/// The domain of a criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Nominal(NominalScale),
    Quantitative(QuantitativeScale),
    Qualitative(QualitativeScale),
    Fuzzy(FuzzyScale),
}

impl Scale {
    /// The normal scale `[0, 1]`, MAX.
    pub fn normal() -> Self {
        Scale::Quantitative(QuantitativeScale::normal())
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Scale::Quantitative(q) if q.is_normal())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scale::Nominal(_) => "nominal",
            Scale::Quantitative(q) if q.is_normal() => "normal",
            Scale::Quantitative(_) => "quantitative",
            Scale::Qualitative(_) => "qualitative",
            Scale::Fuzzy(_) => "fuzzy",
        }
    }

    fn qualitative(&self) -> Option<&QualitativeScale> {
        match self {
            Scale::Qualitative(q) => Some(q),
            Scale::Fuzzy(f) => Some(f.as_qualitative()),
            _ => None,
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Scale::Quantitative(q), Value::Number(x)) => q.contains(*x),
            (Scale::Nominal(n), Value::Label(l)) => n.contains(l),
            (s, Value::Label(l)) => s.qualitative().is_some_and(|q| q.contains(l)),
            _ => false,
        }
    }

    fn out_of_scale(&self, value: &Value) -> SrmpError {
        SrmpError::OutOfScale {
            value: value.to_string(),
            scale: self.kind().into(),
        }
    }

    /// Maps `value` onto the normal scale.
    pub fn normalize(&self, value: &Value) -> Result<f64> {
        match (self, value) {
            (Scale::Nominal(_), _) => Err(SrmpError::IncompatibleScales {
                from: "nominal".into(),
                to: "normal".into(),
            }),
            (Scale::Quantitative(q), Value::Number(x)) => q.normalize(*x),
            (s, Value::Label(l)) => match s.qualitative() {
                Some(q) => q.normalize(l),
                None => Err(s.out_of_scale(value)),
            },
            (s, v) => Err(s.out_of_scale(v)),
        }
    }

    /// Maps a normal-scale value back onto this scale.
    pub fn denormalize(&self, y: f64) -> Result<Value> {
        match self {
            Scale::Nominal(_) => Err(SrmpError::IncompatibleScales {
                from: "normal".into(),
                to: "nominal".into(),
            }),
            Scale::Quantitative(q) => q.denormalize(y).map(Value::Number),
            Scale::Qualitative(q) => q.denormalize(y).map(Value::Label),
            Scale::Fuzzy(f) => f.as_qualitative().denormalize(y).map(Value::Label),
        }
    }

    /// Expresses `value` (valid on `self`) on `target`.
    pub fn transform(&self, value: &Value, target: &Scale) -> Result<Value> {
        if !self.contains(value) {
            return Err(self.out_of_scale(value));
        }
        match (self, target) {
            (Scale::Nominal(_), Scale::Nominal(t)) => match value {
                Value::Label(l) if t.contains(l) => Ok(value.clone()),
                _ => Err(target.out_of_scale(value)),
            },
            (Scale::Nominal(_), _) | (_, Scale::Nominal(_)) => {
                Err(SrmpError::IncompatibleScales {
                    from: self.kind().into(),
                    to: target.kind().into(),
                })
            }
            _ if self == target => Ok(value.clone()),
            _ => target.denormalize(self.normalize(value)?),
        }
    }

    /// Orders two values by preference: `Greater` means `x` is better.
    pub fn compare(&self, x: &Value, y: &Value) -> Result<Ordering> {
        match (self, x, y) {
            (Scale::Nominal(_), _, _) => Err(SrmpError::IncompatibleScales {
                from: "nominal".into(),
                to: "ordered".into(),
            }),
            (Scale::Quantitative(q), Value::Number(a), Value::Number(b)) => q.compare(*a, *b),
            (s, Value::Label(a), Value::Label(b)) => match s.qualitative() {
                Some(q) => q.compare(a, b),
                None => Err(s.out_of_scale(x)),
            },
            (s, Value::Number(_), _) | (s, _, Value::Number(_)) => {
                Err(s.out_of_scale(if matches!(x, Value::Number(_)) { x } else { y }))
            }
        }
    }

    pub fn is_better(&self, x: &Value, y: &Value) -> Result<bool> {
        Ok(self.compare(x, y)? == Ordering::Greater)
    }

    pub fn is_better_or_equal(&self, x: &Value, y: &Value) -> Result<bool> {
        Ok(self.compare(x, y)? != Ordering::Less)
    }
}

impl From<QuantitativeScale> for Scale {
    fn from(q: QuantitativeScale) -> Self {
        Scale::Quantitative(q)
    }
}

impl From<QualitativeScale> for Scale {
    fn from(q: QualitativeScale) -> Self {
        Scale::Qualitative(q)
    }
}
