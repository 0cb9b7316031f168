//! Label-based scales: nominal, qualitative and fuzzy.

use super::quantitative::{PreferenceDirection, QuantitativeScale};
use crate::error::{Result, SrmpError};
use std::cmp::Ordering;
use std::collections::HashSet;

const LABEL_TOLERANCE: f64 = 1e-9;

/// An unordered set of labels. Supports membership only.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalScale {
    labels: Vec<String>,
}

impl NominalScale {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        check_unique(&labels)?;
        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Labels mapped onto numeric values of an underlying quantitative scale.
///
/// Denormalization picks the label on the preferred side of the exact
/// target: the smallest value `>=` target for MAX scales, the largest
/// value `<=` target for MIN scales.
///
/// # Examples
///
/// ```
/// use u_srmp::scale::{PreferenceDirection, QualitativeScale};
///
/// let grades = QualitativeScale::new(
///     [("bad", 0.0), ("fair", 5.0), ("good", 10.0)],
///     PreferenceDirection::Max,
/// ).unwrap();
/// assert_eq!(grades.denormalize(0.3).unwrap(), "fair");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QualitativeScale {
    values: Vec<(String, f64)>,
    inner: QuantitativeScale,
}

impl QualitativeScale {
    /// Builds the scale; needs at least two labels with distinct values.
    pub fn new<I, S>(values: I, direction: PreferenceDirection) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let values: Vec<(String, f64)> = values.into_iter().map(|(l, v)| (l.into(), v)).collect();
        if values.len() < 2 {
            return Err(SrmpError::InvalidScale(
                "qualitative scale needs at least two labels".into(),
            ));
        }
        let labels: Vec<String> = values.iter().map(|(l, _)| l.clone()).collect();
        check_unique(&labels)?;
        for (i, (_, a)) in values.iter().enumerate() {
            if values[i + 1..].iter().any(|(_, b)| a == b) {
                return Err(SrmpError::InvalidScale(format!(
                    "value {a} is assigned to several labels"
                )));
            }
        }
        let dmin = values.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        let dmax = values
            .iter()
            .map(|(_, v)| *v)
            .fold(f64::NEG_INFINITY, f64::max);
        let inner = QuantitativeScale::new(dmin, dmax, direction)?;
        Ok(Self { values, inner })
    }

    pub fn direction(&self) -> PreferenceDirection {
        self.inner.direction
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(l, _)| l.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.values.iter().any(|(l, _)| l == label)
    }

    /// Numeric value associated with `label`.
    pub fn value_of(&self, label: &str) -> Result<f64> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
            .ok_or_else(|| SrmpError::OutOfScale {
                value: label.to_string(),
                scale: "qualitative".into(),
            })
    }

    pub fn normalize(&self, label: &str) -> Result<f64> {
        self.inner.normalize(self.value_of(label)?)
    }

    pub fn denormalize(&self, y: f64) -> Result<String> {
        let target = self.inner.denormalize(y)?;
        let pick = match self.inner.direction {
            PreferenceDirection::Max => self
                .values
                .iter()
                .filter(|(_, v)| *v >= target - LABEL_TOLERANCE)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)),
            PreferenceDirection::Min => self
                .values
                .iter()
                .filter(|(_, v)| *v <= target + LABEL_TOLERANCE)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)),
        };
        pick.map(|(l, _)| l.clone())
            .ok_or_else(|| SrmpError::OutOfScale {
                value: y.to_string(),
                scale: "qualitative".into(),
            })
    }

    pub fn compare(&self, x: &str, y: &str) -> Result<Ordering> {
        self.inner.compare(self.value_of(x)?, self.value_of(y)?)
    }
}

/// A trapezoidal fuzzy number `a <= b <= c <= d`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyNumber {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl FuzzyNumber {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        if !(a <= b && b <= c && c <= d) {
            return Err(SrmpError::InvalidScale(format!(
                "fuzzy number ({a}, {b}, {c}, {d}) is not ordered"
            )));
        }
        Ok(Self { a, b, c, d })
    }

    /// Centre of gravity of the trapezoid.
    pub fn centre_of_gravity(&self) -> f64 {
        let Self { a, b, c, d } = *self;
        let den = 3.0 * (d + c - a - b);
        if den.abs() < f64::EPSILON {
            return a;
        }
        ((d * d + c * c + d * c) - (a * a + b * b + a * b)) / den
    }
}

/// Qualitative scale whose labels carry trapezoidal fuzzy numbers.
///
/// The numeric value of a label is the centre of gravity of its number.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyScale {
    numbers: Vec<(String, FuzzyNumber)>,
    qualitative: QualitativeScale,
}

impl FuzzyScale {
    pub fn new<I, S>(numbers: I, direction: PreferenceDirection) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FuzzyNumber)>,
        S: Into<String>,
    {
        let numbers: Vec<(String, FuzzyNumber)> =
            numbers.into_iter().map(|(l, n)| (l.into(), n)).collect();
        let qualitative = QualitativeScale::new(
            numbers.iter().map(|(l, n)| (l.clone(), n.centre_of_gravity())),
            direction,
        )?;
        Ok(Self {
            numbers,
            qualitative,
        })
    }

    pub fn fuzzy_number(&self, label: &str) -> Option<&FuzzyNumber> {
        self.numbers.iter().find(|(l, _)| l == label).map(|(_, n)| n)
    }

    pub fn as_qualitative(&self) -> &QualitativeScale {
        &self.qualitative
    }
}

fn check_unique(labels: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(SrmpError::DuplicateLabel(label.clone()));
        }
    }
    Ok(())
}
