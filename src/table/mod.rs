//! Performance tables.
//!
//! A [`PerformanceTable`] holds one [`Value`] per (alternative, criterion)
//! pair, each criterion tagged with its [`Scale`]. A [`NormalTable`] is the
//! dense `f64` form on the normal scale used by the ranking rule and the
//! learners.

mod normal;

pub use normal::NormalTable;

use crate::error::{Result, SrmpError};
use crate::scale::{Scale, Value};
use std::collections::HashSet;

/// Labeled alternatives × criteria matrix with per-criterion scales.
///
/// # Examples
///
/// ```
/// use u_srmp::scale::{PreferenceDirection, QuantitativeScale, Scale, Value};
/// use u_srmp::table::PerformanceTable;
///
/// let price: Scale = QuantitativeScale::new(0.0, 100.0, PreferenceDirection::Min).unwrap().into();
/// let table = PerformanceTable::new(
///     vec!["a".into(), "b".into()],
///     vec!["price".into()],
///     vec![price],
///     vec![vec![Value::Number(20.0)], vec![Value::Number(80.0)]],
/// ).unwrap();
/// let normal = table.normalize().unwrap();
/// assert!(normal.value(0, 0) > normal.value(1, 0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTable {
    alternatives: Vec<String>,
    criteria: Vec<String>,
    scales: Vec<Scale>,
    rows: Vec<Vec<Value>>,
}

impl PerformanceTable {
    /// Builds a table, checking label uniqueness, shape and scale membership.
    pub fn new(
        alternatives: Vec<String>,
        criteria: Vec<String>,
        scales: Vec<Scale>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        check_unique_labels(&alternatives)?;
        check_unique_labels(&criteria)?;
        if scales.len() != criteria.len() {
            return Err(SrmpError::ShapeMismatch(format!(
                "{} criteria but {} scales",
                criteria.len(),
                scales.len()
            )));
        }
        if rows.len() != alternatives.len() {
            return Err(SrmpError::ShapeMismatch(format!(
                "{} alternatives but {} rows",
                alternatives.len(),
                rows.len()
            )));
        }
        for (alt, row) in alternatives.iter().zip(&rows) {
            if row.len() != criteria.len() {
                return Err(SrmpError::ShapeMismatch(format!(
                    "row `{alt}` has {} values for {} criteria",
                    row.len(),
                    criteria.len()
                )));
            }
            for (value, scale) in row.iter().zip(&scales) {
                if !scale.contains(value) {
                    return Err(SrmpError::OutOfScale {
                        value: value.to_string(),
                        scale: scale.kind().into(),
                    });
                }
            }
        }
        Ok(Self {
            alternatives,
            criteria,
            scales,
            rows,
        })
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn scales(&self) -> &[Scale] {
        &self.scales
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, alternative: usize, criterion: usize) -> &Value {
        &self.rows[alternative][criterion]
    }

    pub fn row(&self, alternative: usize) -> &[Value] {
        &self.rows[alternative]
    }

    /// Sub-table with the given alternatives, in the given order.
    pub fn select_alternatives(&self, indices: &[usize]) -> Result<Self> {
        let mut alternatives = Vec::with_capacity(indices.len());
        let mut rows = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = self.rows.get(i).ok_or_else(|| {
                SrmpError::ShapeMismatch(format!("alternative index {i} out of range"))
            })?;
            alternatives.push(self.alternatives[i].clone());
            rows.push(row.clone());
        }
        Self::new(alternatives, self.criteria.clone(), self.scales.clone(), rows)
    }

    /// Sub-table with the given criteria, in the given order.
    pub fn select_criteria(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&j| j >= self.criteria.len()) {
            return Err(SrmpError::ShapeMismatch(format!(
                "criterion index {bad} out of range"
            )));
        }
        let criteria = indices.iter().map(|&j| self.criteria[j].clone()).collect();
        let scales = indices.iter().map(|&j| self.scales[j].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&j| row[j].clone()).collect())
            .collect();
        Self::new(self.alternatives.clone(), criteria, scales, rows)
    }

    /// Stacks the alternatives of `other` below those of `self`.
    ///
    /// Both tables must share criteria and scales.
    pub fn concat(&self, other: &Self) -> Result<Self> {
        if self.criteria != other.criteria || self.scales != other.scales {
            return Err(SrmpError::ShapeMismatch(
                "cannot concatenate tables with different criteria".into(),
            ));
        }
        let alternatives = self
            .alternatives
            .iter()
            .chain(&other.alternatives)
            .cloned()
            .collect();
        let rows = self.rows.iter().chain(&other.rows).cloned().collect();
        Self::new(alternatives, self.criteria.clone(), self.scales.clone(), rows)
    }

    /// Expresses every column on the given target scales.
    pub fn transform(&self, targets: &[Scale]) -> Result<Self> {
        if targets.len() != self.scales.len() {
            return Err(SrmpError::ShapeMismatch(format!(
                "{} target scales for {} criteria",
                targets.len(),
                self.scales.len()
            )));
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.scales.iter().zip(targets))
                    .map(|(v, (from, to))| from.transform(v, to))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(
            self.alternatives.clone(),
            self.criteria.clone(),
            targets.to_vec(),
            rows,
        )
    }

    /// Normal-scale form of the table.
    pub fn normalize(&self) -> Result<NormalTable> {
        let data = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.scales)
                    .map(|(v, s)| s.normalize(v))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        NormalTable::new(self.alternatives.clone(), self.criteria.clone(), data)
    }
}

pub(crate) fn check_unique_labels(labels: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(SrmpError::DuplicateLabel(label.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{PreferenceDirection, QualitativeScale, QuantitativeScale};

    fn sample() -> PerformanceTable {
        let cost: Scale = QuantitativeScale::new(0.0, 10.0, PreferenceDirection::Min)
            .unwrap()
            .into();
        let grade: Scale = QualitativeScale::new(
            [("low", 1.0), ("mid", 2.0), ("high", 3.0)],
            PreferenceDirection::Max,
        )
        .unwrap()
        .into();
        PerformanceTable::new(
            vec!["x".into(), "y".into(), "z".into()],
            vec!["cost".into(), "grade".into()],
            vec![cost, grade],
            vec![
                vec![Value::Number(2.0), Value::from("high")],
                vec![Value::Number(5.0), Value::from("mid")],
                vec![Value::Number(10.0), Value::from("low")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_alternatives() {
        let r = PerformanceTable::new(
            vec!["a".into(), "a".into()],
            vec!["c".into()],
            vec![Scale::normal()],
            vec![vec![Value::Number(0.1)], vec![Value::Number(0.2)]],
        );
        assert!(matches!(r, Err(SrmpError::DuplicateLabel(_))));
    }

    #[test]
    fn test_rejects_scale_key_mismatch() {
        let r = PerformanceTable::new(
            vec!["a".into()],
            vec!["c".into(), "d".into()],
            vec![Scale::normal()],
            vec![vec![Value::Number(0.1), Value::Number(0.2)]],
        );
        assert!(matches!(r, Err(SrmpError::ShapeMismatch(_))));
    }

    #[test]
    fn test_rejects_value_outside_scale() {
        let r = PerformanceTable::new(
            vec!["a".into()],
            vec!["c".into()],
            vec![Scale::normal()],
            vec![vec![Value::Number(1.2)]],
        );
        assert!(matches!(r, Err(SrmpError::OutOfScale { .. })));
    }

    #[test]
    fn test_normalize() {
        let n = sample().normalize().unwrap();
        assert!((n.value(0, 0) - 0.8).abs() < 1e-12);
        assert!((n.value(0, 1) - 1.0).abs() < 1e-12);
        assert!((n.value(2, 0)).abs() < 1e-12);
        assert!((n.value(1, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_select_and_concat() {
        let t = sample();
        let top = t.select_alternatives(&[0]).unwrap();
        let rest = t.select_alternatives(&[1, 2]).unwrap();
        assert_eq!(top.concat(&rest).unwrap(), t);
        assert!(top.concat(&top).is_err());

        let grades = t.select_criteria(&[1]).unwrap();
        assert_eq!(grades.criteria(), &["grade".to_string()]);
        assert_eq!(grades.value(2, 0), &Value::from("low"));
        assert!(t.select_criteria(&[4]).is_err());
    }

    #[test]
    fn test_transform_to_normal() {
        let t = sample();
        let normal = t.transform(&[Scale::normal(), Scale::normal()]).unwrap();
        assert!(normal.scales().iter().all(Scale::is_normal));
        assert_eq!(normal.normalize().unwrap(), t.normalize().unwrap());
    }
}
