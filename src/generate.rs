//! Synthetic data for experiments: tables, models and comparisons.
//!
//! Every generator takes the random source explicitly; seed it with
//! `u_numflow::random::create_rng` for reproducible runs.

use crate::error::{Result, SrmpError};
use crate::model::{Coalition, ModelKind, PowerSet, SrmpModel, Weights, MAX_PROFILES};
use crate::relations::{PreferenceStructure, Ranking, Relation};
use crate::table::NormalTable;
use rand::Rng;
use u_numflow::random::shuffle;

/// Table of `n_alternatives` rows with values drawn uniformly in `[0, 1]`.
pub fn random_table<R: Rng>(
    n_alternatives: usize,
    n_criteria: usize,
    rng: &mut R,
) -> Result<NormalTable> {
    let rows = (0..n_alternatives)
        .map(|_| (0..n_criteria).map(|_| rng.random_range(0.0..=1.0)).collect())
        .collect();
    NormalTable::from_rows(rows)
}

/// `n` distinct rows of `table`, drawn without replacement.
pub fn sample_table<R: Rng>(table: &NormalTable, n: usize, rng: &mut R) -> Result<NormalTable> {
    if n > table.len() {
        return Err(SrmpError::ShapeMismatch(format!(
            "cannot sample {n} alternatives from {}",
            table.len()
        )));
    }
    let mut indices: Vec<usize> = (0..table.len()).collect();
    shuffle(&mut indices, rng);
    indices.truncate(n);
    indices.sort_unstable();
    table.select(&indices)
}

fn check_profiles(k: usize) -> Result<()> {
    if k == 0 || k > MAX_PROFILES {
        return Err(SrmpError::InvalidModel(format!(
            "expected 1..={MAX_PROFILES} profiles, got {k}"
        )));
    }
    Ok(())
}

fn shuffled_order<R: Rng>(k: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..k).collect();
    shuffle(&mut order, rng);
    order
}

/// Random monotone capacity with integer values.
///
/// Each coalition gets the largest capacity among its immediate subsets
/// plus a random increment in `0..=2`, capped by the full set's `m - 1`.
pub fn random_capacities<R: Rng>(n_criteria: usize, rng: &mut R) -> Result<PowerSet> {
    let cap = PowerSet::new(n_criteria)?.full_value();
    let mut values = vec![0.0f64; 1 << n_criteria];
    let full = values.len() - 1;
    for bits in 1..full {
        let coalition = Coalition(bits as u64);
        let floor = coalition
            .iter()
            .map(|j| values[coalition.without(j).index()])
            .fold(0.0, f64::max);
        values[bits] = (floor + f64::from(rng.random_range(0..=2u8))).min(cap);
    }
    values[full] = cap;
    PowerSet::from_values(n_criteria, values)
}

/// Random model: per-criterion sorted uniform profiles, random importance
/// and a shuffled lexicographic order.
pub fn random_model<R: Rng>(
    kind: ModelKind,
    k: usize,
    n_criteria: usize,
    rng: &mut R,
) -> Result<SrmpModel> {
    check_profiles(k)?;
    let mut profiles = vec![vec![0.0; n_criteria]; k];
    for j in 0..n_criteria {
        let mut column: Vec<f64> = (0..k).map(|_| rng.random_range(0.0..=1.0)).collect();
        column.sort_by(f64::total_cmp);
        for (h, x) in column.into_iter().enumerate() {
            profiles[h][j] = x;
        }
    }
    let order = shuffled_order(k, rng);
    match kind {
        ModelKind::Srmp => {
            let raw = (0..n_criteria).map(|_| rng.random_range(0.0..1.0)).collect();
            SrmpModel::srmp(Weights::normalized(raw)?, profiles, order)
        }
        ModelKind::Rmp => SrmpModel::rmp(random_capacities(n_criteria, rng)?, profiles, order),
    }
}

/// Candidate profile levels per criterion: `0`, the midpoints between
/// consecutive distinct values of the column, and `1`.
///
/// A profile sitting on a candidate separates the alternatives below it
/// from those above it.
pub fn profile_candidates(table: &NormalTable) -> Vec<Vec<f64>> {
    (0..table.n_criteria())
        .map(|j| {
            let mut values = table.column(j);
            values.sort_by(f64::total_cmp);
            values.dedup();
            let mut candidates = Vec::with_capacity(values.len() + 1);
            candidates.push(0.0);
            candidates.extend(values.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            candidates.push(1.0);
            candidates.dedup();
            candidates
        })
        .collect()
}

/// Neutral starting model for `table`: profiles evenly spread over the
/// candidate levels, uniform importance and a random order.
pub fn balanced_model<R: Rng>(
    kind: ModelKind,
    k: usize,
    table: &NormalTable,
    rng: &mut R,
) -> Result<SrmpModel> {
    check_profiles(k)?;
    let candidates = profile_candidates(table);
    let profiles = (0..k)
        .map(|h| {
            candidates
                .iter()
                .map(|levels| levels[(((h + 1) * levels.len()) / (k + 1)).min(levels.len() - 1)])
                .collect()
        })
        .collect();
    let order = shuffled_order(k, rng);
    let m = table.n_criteria();
    match kind {
        ModelKind::Srmp => SrmpModel::srmp(Weights::uniform(m)?, profiles, order),
        ModelKind::Rmp => SrmpModel::rmp(PowerSet::cardinality(m)?, profiles, order),
    }
}

/// Draws `n_pairs` distinct pairs and labels them from `ranking`.
///
/// Pairs with different ranks become preferences towards the better rank;
/// ties become indifferences. With probability `noise` a preference is
/// flipped.
pub fn comparisons<R: Rng>(
    ranking: &Ranking,
    n_pairs: usize,
    noise: f64,
    rng: &mut R,
) -> Result<PreferenceStructure> {
    if !(0.0..=1.0).contains(&noise) {
        return Err(SrmpError::InvalidConfig(format!(
            "noise must be in [0, 1], got {noise}"
        )));
    }
    let entries: Vec<(usize, usize)> = ranking.iter().collect();
    let mut pairs = Vec::with_capacity(entries.len() * entries.len().saturating_sub(1) / 2);
    for (i, &a) in entries.iter().enumerate() {
        for &b in &entries[i + 1..] {
            pairs.push((a, b));
        }
    }
    if n_pairs > pairs.len() {
        return Err(SrmpError::ShapeMismatch(format!(
            "cannot draw {n_pairs} distinct pairs from {} alternatives",
            entries.len()
        )));
    }
    shuffle(&mut pairs, rng);
    let mut structure = PreferenceStructure::new();
    for ((a, ra), (b, rb)) in pairs.into_iter().take(n_pairs) {
        let (better, worse) = if ra <= rb { (a, b) } else { (b, a) };
        let relation = if ra == rb {
            Relation::indifference(a, b)
        } else if rng.random_bool(noise) {
            Relation::preference(worse, better)
        } else {
            Relation::preference(better, worse)
        };
        structure.add(relation)?;
    }
    Ok(structure)
}
