//! Dense rankings and fitness against comparison sets.

use super::{PreferenceStructure, Relation, RelationKind};
use crate::error::{Result, SrmpError};
use std::collections::BTreeMap;

/// Alternative → rank, rank 1 = best, ties share a rank, no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    ranks: BTreeMap<usize, usize>,
}

impl Ranking {
    /// Builds a ranking from raw ranks (lower = better).
    ///
    /// Ranks are re-numbered densely: `[(0, 1), (1, 5), (2, 5)]` becomes
    /// `1, 2, 2`.
    pub fn from_ranks<I: IntoIterator<Item = (usize, usize)>>(ranks: I) -> Self {
        let raw: BTreeMap<usize, usize> = ranks.into_iter().collect();
        let (elements, scores): (Vec<usize>, Vec<i64>) =
            raw.iter().map(|(&a, &r)| (a, -(r as i64))).unzip();
        Self::from_scores(&elements, &scores)
    }

    /// Dense ranking where a higher score is better.
    pub fn from_scores<S: Ord + Copy>(elements: &[usize], scores: &[S]) -> Self {
        let mut distinct: Vec<S> = scores.to_vec();
        distinct.sort_unstable_by(|a, b| b.cmp(a));
        distinct.dedup();
        let ranks = elements
            .iter()
            .zip(scores)
            .map(|(&a, s)| {
                let position = distinct.binary_search_by(|probe| s.cmp(probe)).unwrap_or(0);
                (a, position + 1)
            })
            .collect();
        Self { ranks }
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn rank_of(&self, alternative: usize) -> Option<usize> {
        self.ranks.get(&alternative).copied()
    }

    /// `(alternative, rank)` pairs in alternative order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranks.iter().map(|(&a, &r)| (a, r))
    }

    /// Ranks listed in alternative order.
    pub fn to_vec(&self) -> Vec<usize> {
        self.ranks.values().copied().collect()
    }

    /// One relation per pair: `P` towards the better rank, `I` on ties.
    pub fn to_preference_structure(&self) -> PreferenceStructure {
        let entries: Vec<(usize, usize)> = self.iter().collect();
        let mut relations = Vec::with_capacity(entries.len() * entries.len() / 2);
        for (i, &(a, ra)) in entries.iter().enumerate() {
            for &(b, rb) in &entries[i + 1..] {
                relations.push(match ra.cmp(&rb) {
                    std::cmp::Ordering::Less => Relation::preference(a, b),
                    std::cmp::Ordering::Greater => Relation::preference(b, a),
                    std::cmp::Ordering::Equal => Relation::indifference(a, b),
                });
            }
        }
        relations.into_iter().collect()
    }

    pub fn from_preference_structure(structure: &PreferenceStructure) -> Result<Self> {
        structure.to_ranking()
    }

    /// Whether this ranking agrees with one comparison.
    ///
    /// A ranking never reproduces incomparability.
    pub fn reproduces(&self, relation: &Relation) -> bool {
        let (Some(ra), Some(rb)) = (self.rank_of(relation.a), self.rank_of(relation.b)) else {
            return false;
        };
        match relation.kind {
            RelationKind::Preference => ra < rb,
            RelationKind::Indifference => ra == rb,
            RelationKind::Incomparable => false,
        }
    }

    /// Fraction of `comparisons` reproduced, in `[0, 1]`.
    pub fn fitness(&self, comparisons: &PreferenceStructure) -> Result<f64> {
        if comparisons.is_empty() {
            return Err(SrmpError::EmptyComparisons);
        }
        let hits = comparisons.relations().filter(|r| self.reproduces(r)).count();
        Ok(hits as f64 / comparisons.len() as f64)
    }
}
