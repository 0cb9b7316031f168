//! Dense normal-scale performance table and its CSV codec.

use super::{check_unique_labels, PerformanceTable};
use crate::error::{Result, SrmpError};
use crate::scale::{Scale, Value};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Alternatives × criteria matrix with every value in `[0, 1]`, MAX.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalTable {
    alternatives: Vec<String>,
    criteria: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl NormalTable {
    pub fn new(alternatives: Vec<String>, criteria: Vec<String>, data: Vec<Vec<f64>>) -> Result<Self> {
        check_unique_labels(&alternatives)?;
        check_unique_labels(&criteria)?;
        if data.len() != alternatives.len() {
            return Err(SrmpError::ShapeMismatch(format!(
                "{} alternatives but {} rows",
                alternatives.len(),
                data.len()
            )));
        }
        for row in &data {
            if row.len() != criteria.len() {
                return Err(SrmpError::ShapeMismatch(format!(
                    "row of {} values for {} criteria",
                    row.len(),
                    criteria.len()
                )));
            }
            if let Some(bad) = row.iter().find(|x| !(0.0..=1.0).contains(*x)) {
                return Err(SrmpError::OutOfScale {
                    value: bad.to_string(),
                    scale: "normal".into(),
                });
            }
        }
        Ok(Self {
            alternatives,
            criteria,
            data,
        })
    }

    /// Builds a table labelled by row and column position (`"0"`, `"1"`, ...).
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Self> {
        let n_criteria = data.first().map_or(0, Vec::len);
        Self::new(
            (0..data.len()).map(|i| i.to_string()).collect(),
            (0..n_criteria).map(|j| j.to_string()).collect(),
            data,
        )
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn n_criteria(&self) -> usize {
        self.criteria.len()
    }

    pub fn value(&self, alternative: usize, criterion: usize) -> f64 {
        self.data[alternative][criterion]
    }

    pub fn row(&self, alternative: usize) -> &[f64] {
        &self.data[alternative]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn column(&self, criterion: usize) -> Vec<f64> {
        self.data.iter().map(|row| row[criterion]).collect()
    }

    /// Sub-table with the given alternatives, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut alternatives = Vec::with_capacity(indices.len());
        let mut data = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = self.data.get(i).ok_or_else(|| {
                SrmpError::ShapeMismatch(format!("alternative index {i} out of range"))
            })?;
            alternatives.push(self.alternatives[i].clone());
            data.push(row.clone());
        }
        Self::new(alternatives, self.criteria.clone(), data)
    }

    /// Stacks the alternatives of `other` below those of `self`.
    pub fn concat(&self, other: &Self) -> Result<Self> {
        if self.criteria != other.criteria {
            return Err(SrmpError::ShapeMismatch(
                "cannot concatenate tables with different criteria".into(),
            ));
        }
        Self::new(
            self.alternatives
                .iter()
                .chain(&other.alternatives)
                .cloned()
                .collect(),
            self.criteria.clone(),
            self.data.iter().chain(&other.data).cloned().collect(),
        )
    }

    /// The same table as a [`PerformanceTable`] on normal scales.
    pub fn to_table(&self) -> PerformanceTable {
        PerformanceTable {
            alternatives: self.alternatives.clone(),
            criteria: self.criteria.clone(),
            scales: vec![Scale::normal(); self.criteria.len()],
            rows: self
                .data
                .iter()
                .map(|row| row.iter().map(|&x| Value::Number(x)).collect())
                .collect(),
        }
    }

    /// Maps every column back onto `scales`.
    pub fn denormalize(&self, scales: &[Scale]) -> Result<PerformanceTable> {
        self.to_table().transform(scales)
    }

    /// Parses headerless CSV: one row per alternative, one column per criterion.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut data = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|e| {
                        SrmpError::Parse(format!("line {}: `{field}`: {e}", lineno + 1))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            data.push(row);
        }
        Self::from_rows(data)
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_str(&fs::read_to_string(path)?)
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        for row in &self.data {
            let line: Vec<String> = row.iter().map(|x| x.to_string()).collect();
            let _ = writeln!(out, "{}", line.join(","));
        }
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_csv_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{PreferenceDirection, QuantitativeScale};

    #[test]
    fn test_rejects_values_outside_unit_interval() {
        assert!(NormalTable::from_rows(vec![vec![0.2, 1.1]]).is_err());
        assert!(NormalTable::from_rows(vec![vec![0.2, 0.3], vec![0.1]]).is_err());
    }

    #[test]
    fn test_csv_round_trip() {
        let t = NormalTable::from_rows(vec![vec![0.25, 0.5], vec![1.0, 0.0]]).unwrap();
        let back = NormalTable::from_csv_str(&t.to_csv_string()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_csv_parse_error_mentions_line() {
        let err = NormalTable::from_csv_str("0.1,0.2\n0.3,abc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alternatives.csv");
        let t = NormalTable::from_rows(vec![vec![0.1, 0.9, 0.4]]).unwrap();
        t.write_csv(&path).unwrap();
        assert_eq!(NormalTable::read_csv(&path).unwrap(), t);
    }

    #[test]
    fn test_select_concat_column() {
        let t = NormalTable::from_rows(vec![vec![0.1], vec![0.2], vec![0.3]]).unwrap();
        let s = t.select(&[2, 0]).unwrap();
        assert_eq!(s.column(0), vec![0.3, 0.1]);
        assert_eq!(s.alternatives(), &["2".to_string(), "0".to_string()]);
        assert!(s.concat(&t).is_err());
        assert_eq!(t.select(&[0]).unwrap().concat(&t.select(&[1, 2]).unwrap()).unwrap(), t);
    }

    #[test]
    fn test_denormalize() {
        let t = NormalTable::from_rows(vec![vec![0.25]]).unwrap();
        let price: Scale = QuantitativeScale::new(0.0, 100.0, PreferenceDirection::Min)
            .unwrap()
            .into();
        let back = t.denormalize(&[price]).unwrap();
        assert_eq!(back.value(0, 0), &Value::Number(75.0));
    }
}
