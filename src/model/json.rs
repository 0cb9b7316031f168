//! JSON codec for SRMP/RMP models.
//!
//! Reading is two-phase: the text is parsed into a generic JSON tree
//! (syntax problems surface as [`SrmpError::Parse`]), then the tree is
//! checked and turned into an immutable [`SrmpModel`] (shape problems
//! surface as [`SrmpError::Validation`], model invariants as their own
//! variants).

use super::capacity::{PowerSet, MAX_CAPACITY_CRITERIA};
use super::importance::{Coalition, Importance, Weights};
use super::srmp::SrmpModel;
use crate::error::{Result, SrmpError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SrmpDocument {
    profiles: Vec<Vec<f64>>,
    weights: Vec<f64>,
    lexicographic_order: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RmpDocument {
    profiles: Vec<Vec<f64>>,
    capacities: BTreeMap<String, f64>,
    lexicographic_order: Vec<usize>,
}

/// Parses a set literal: `{0, 2}`, `{}`, `set()`, `frozenset()` or
/// `frozenset({0, 2})`.
pub fn parse_coalition(text: &str, n_criteria: usize) -> Result<Coalition> {
    let invalid = || SrmpError::Validation(format!("invalid set literal `{text}`"));
    let mut body = text.trim();
    if let Some(inner) = body
        .strip_prefix("frozenset(")
        .or_else(|| body.strip_prefix("set("))
    {
        body = inner.strip_suffix(')').ok_or_else(invalid)?.trim();
        if body.is_empty() {
            return Ok(Coalition::EMPTY);
        }
    }
    let body = body
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .ok_or_else(invalid)?;
    let mut coalition = Coalition::EMPTY;
    for item in body.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let j: usize = item.parse().map_err(|_| invalid())?;
        if j >= n_criteria {
            return Err(SrmpError::Validation(format!(
                "criterion {j} in `{text}` exceeds {n_criteria} criteria"
            )));
        }
        coalition = coalition.with(j);
    }
    Ok(coalition)
}

impl SrmpModel {
    /// Serializes to the SRMP (`weights`) or RMP (`capacities`) document.
    pub fn to_json_string(&self) -> Result<String> {
        let text = match &self.importance {
            Importance::Weights(w) => serde_json::to_string(&SrmpDocument {
                profiles: self.profiles.clone(),
                weights: w.as_slice().to_vec(),
                lexicographic_order: self.lexicographic_order.clone(),
            })?,
            Importance::Capacities(mu) => serde_json::to_string(&RmpDocument {
                profiles: self.profiles.clone(),
                capacities: mu.iter().map(|(c, v)| (c.to_string(), v)).collect(),
                lexicographic_order: self.lexicographic_order.clone(),
            })?,
        };
        Ok(text)
    }

    /// Reads either document kind.
    ///
    /// The kind is chosen by probing the raw text for `"capacities"`, then
    /// `"weights"`.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let tree: serde_json::Value = serde_json::from_str(text)?;
        let shape = |e: serde_json::Error| SrmpError::Validation(e.to_string());
        if text.contains("capacities") {
            let doc: RmpDocument = serde_json::from_value(tree).map_err(shape)?;
            let n = doc.profiles.first().map_or(0, Vec::len);
            if n == 0 || n > MAX_CAPACITY_CRITERIA {
                return Err(SrmpError::Validation(format!(
                    "cannot hold capacities for {n} criteria"
                )));
            }
            let mut values = vec![None; 1 << n];
            for (key, value) in &doc.capacities {
                let c = parse_coalition(key, n)?;
                if values[c.index()].replace(*value).is_some() {
                    return Err(SrmpError::Validation(format!("duplicate capacity for {c}")));
                }
            }
            let values = values
                .into_iter()
                .enumerate()
                .map(|(bits, v)| {
                    v.ok_or_else(|| {
                        SrmpError::Validation(format!(
                            "missing capacity for {}",
                            Coalition(bits as u64)
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            let mu = PowerSet::from_values(n, values)?;
            SrmpModel::rmp(mu, doc.profiles, doc.lexicographic_order)
        } else if text.contains("weights") {
            let doc: SrmpDocument = serde_json::from_value(tree).map_err(shape)?;
            SrmpModel::srmp(Weights::new(doc.weights)?, doc.profiles, doc.lexicographic_order)
        } else {
            Err(SrmpError::Validation(
                "document has neither `weights` nor `capacities`".into(),
            ))
        }
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}
