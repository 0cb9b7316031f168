//! Pairwise preference relations.
//!
//! # Key Components
//!
//! - [`Relation`]: `aPb`, `aIb` or `aRb` between two alternatives
//! - [`PreferenceStructure`]: a compatible set of relations, at most one
//!   per unordered pair
//! - [`OutrankingMatrix`]: 0/1 "at least as good as" adjacency
//! - [`Ranking`]: dense ranks, rank 1 = best
//!
//! Alternatives are identified by their row index in the performance table.

mod matrix;
mod ranking;

pub use matrix::OutrankingMatrix;
pub use ranking::Ranking;

use crate::error::{Result, SrmpError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Kind of a pairwise relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// `a` is strictly preferred to `b`.
    Preference,
    /// `a` and `b` are equivalent.
    Indifference,
    /// `a` and `b` cannot be compared.
    Incomparable,
}

impl RelationKind {
    fn code(self) -> &'static str {
        match self {
            RelationKind::Preference => "P",
            RelationKind::Indifference => "I",
            RelationKind::Incomparable => "R",
        }
    }
}

/// A relation between two distinct alternatives.
///
/// Symmetric kinds are stored with `a < b`, so two relations describing
/// the same fact compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Relation {
    pub a: usize,
    pub b: usize,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(a: usize, b: usize, kind: RelationKind) -> Self {
        match kind {
            RelationKind::Preference => Self { a, b, kind },
            _ => Self {
                a: a.min(b),
                b: a.max(b),
                kind,
            },
        }
    }

    pub fn preference(a: usize, b: usize) -> Self {
        Self::new(a, b, RelationKind::Preference)
    }

    pub fn indifference(a: usize, b: usize) -> Self {
        Self::new(a, b, RelationKind::Indifference)
    }

    pub fn incomparable(a: usize, b: usize) -> Self {
        Self::new(a, b, RelationKind::Incomparable)
    }

    /// Unordered pair key.
    fn key(&self) -> (usize, usize) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.a, self.kind.code(), self.b)
    }
}

/// A compatible set of relations over alternatives.
///
/// # Examples
///
/// ```
/// use u_srmp::relations::{PreferenceStructure, Relation};
///
/// let mut d = PreferenceStructure::new();
/// d.add(Relation::preference(0, 1)).unwrap();
/// d.add(Relation::indifference(1, 2)).unwrap();
/// assert!(d.add(Relation::preference(1, 0)).is_err());
/// assert_eq!(d.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceStructure {
    relations: BTreeMap<(usize, usize), Relation>,
}

impl PreferenceStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a structure, rejecting conflicting relations.
    pub fn from_relations<I: IntoIterator<Item = Relation>>(relations: I) -> Result<Self> {
        let mut s = Self::new();
        for r in relations {
            s.add(r)?;
        }
        Ok(s)
    }

    /// Adds a relation. Re-adding the same relation is a no-op; a different
    /// relation on the same pair is an error.
    pub fn add(&mut self, relation: Relation) -> Result<()> {
        if relation.a == relation.b {
            return Err(SrmpError::IncompatibleRelation {
                new: relation.to_string(),
                existing: "reflexive pair".into(),
            });
        }
        match self.relations.get(&relation.key()) {
            Some(existing) if *existing != relation => Err(SrmpError::IncompatibleRelation {
                new: relation.to_string(),
                existing: existing.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.relations.insert(relation.key(), relation);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// Relation held on the unordered pair `{a, b}`, if any.
    pub fn get(&self, a: usize, b: usize) -> Option<&Relation> {
        self.relations.get(&(a.min(b), a.max(b)))
    }

    pub fn elements(&self) -> BTreeSet<usize> {
        self.relations.values().flat_map(|r| [r.a, r.b]).collect()
    }

    fn of_kind(&self, kind: RelationKind) -> impl Iterator<Item = &Relation> {
        self.relations.values().filter(move |r| r.kind == kind)
    }

    pub fn preferences(&self) -> impl Iterator<Item = &Relation> {
        self.of_kind(RelationKind::Preference)
    }

    pub fn indifferences(&self) -> impl Iterator<Item = &Relation> {
        self.of_kind(RelationKind::Indifference)
    }

    pub fn incomparables(&self) -> impl Iterator<Item = &Relation> {
        self.of_kind(RelationKind::Incomparable)
    }

    /// Outranking matrix over the structure's own elements.
    pub fn to_outranking(&self) -> OutrankingMatrix {
        self.to_outranking_over(self.elements().into_iter().collect())
    }

    /// Outranking matrix over `elements`; relations on other elements are
    /// ignored.
    pub fn to_outranking_over(&self, elements: Vec<usize>) -> OutrankingMatrix {
        let mut m = OutrankingMatrix::identity(elements);
        for r in self.relations.values() {
            let (Some(i), Some(j)) = (m.position(r.a), m.position(r.b)) else {
                continue;
            };
            match r.kind {
                RelationKind::Preference => m.set(i, j, true),
                RelationKind::Indifference => {
                    m.set(i, j, true);
                    m.set(j, i, true);
                }
                RelationKind::Incomparable => {}
            }
        }
        m
    }

    /// One relation per pair of the matrix's elements.
    pub fn from_outranking(matrix: &OutrankingMatrix) -> Self {
        let elements = matrix.elements();
        let mut relations = BTreeMap::new();
        for i in 0..elements.len() {
            for j in i + 1..elements.len() {
                let (a, b) = (elements[i], elements[j]);
                let r = match (matrix.get(i, j), matrix.get(j, i)) {
                    (true, true) => Relation::indifference(a, b),
                    (true, false) => Relation::preference(a, b),
                    (false, true) => Relation::preference(b, a),
                    (false, false) => Relation::incomparable(a, b),
                };
                relations.insert(r.key(), r);
            }
        }
        Self { relations }
    }

    /// The structure implied by transitivity of its outranking relation.
    pub fn transitive_closure(&self) -> Self {
        Self::from_outranking(&self.to_outranking().transitive_closure())
    }

    /// True when the closure leaves no pair incomparable.
    pub fn is_total_preorder(&self) -> bool {
        self.transitive_closure().incomparables().next().is_none()
    }

    /// True for a total preorder without indifference.
    pub fn is_total_order(&self) -> bool {
        let closure = self.transitive_closure();
        closure.incomparables().next().is_none() && closure.indifferences().next().is_none()
    }

    /// Ranking induced by a total preorder.
    pub fn to_ranking(&self) -> Result<Ranking> {
        let closure = self.to_outranking().transitive_closure();
        let structure = Self::from_outranking(&closure);
        if structure.incomparables().next().is_some() {
            return Err(SrmpError::NotTotalPreorder);
        }
        let counts = closure.row_counts();
        Ok(Ranking::from_scores(closure.elements(), &counts))
    }

    /// Parses `a,TYPE,b` lines with `TYPE` in `P`, `I`, `R`.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut s = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let parse_err = |msg: String| SrmpError::Parse(format!("line {}: {msg}", lineno + 1));
            let [a, kind, b] = fields[..] else {
                return Err(parse_err(format!("expected `a,TYPE,b`, got `{line}`")));
            };
            let a: usize = a.parse().map_err(|e| parse_err(format!("`{a}`: {e}")))?;
            let b: usize = b.parse().map_err(|e| parse_err(format!("`{b}`: {e}")))?;
            let kind = match kind {
                "P" => RelationKind::Preference,
                "I" => RelationKind::Indifference,
                "R" => RelationKind::Incomparable,
                other => return Err(parse_err(format!("unknown relation type `{other}`"))),
            };
            s.add(Relation::new(a, b, kind))?;
        }
        Ok(s)
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_str(&fs::read_to_string(path)?)
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        for r in self.relations.values() {
            let _ = writeln!(out, "{},{},{}", r.a, r.kind.code(), r.b);
        }
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_csv_string())?;
        Ok(())
    }
}

impl FromIterator<Relation> for PreferenceStructure {
    /// Collects relations, keeping the first one seen on each pair.
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        let mut relations = BTreeMap::new();
        for r in iter {
            if r.a != r.b {
                relations.entry(r.key()).or_insert(r);
            }
        }
        Self { relations }
    }
}
