//! Profile-wise outranking and lexicographic aggregation.
//!
//! For one profile, each alternative is reduced to the scalar strength of
//! the coalition of criteria on which it meets the profile. Alternative
//! `i` outranks `j` under that profile iff its strength is at least `j`'s.
//! The `k` per-profile matrices are then merged lexicographically.

use super::importance::{Coalition, CoalitionValue};
use crate::relations::{OutrankingMatrix, Ranking};
use crate::table::NormalTable;

/// Criteria on which `alternative` is at least as good as `profile`.
pub fn coalition(alternative: &[f64], profile: &[f64]) -> Coalition {
    Coalition::from_criteria(
        alternative
            .iter()
            .zip(profile)
            .enumerate()
            .filter(|(_, (x, p))| x >= p)
            .map(|(j, _)| j),
    )
}

/// Strength of every alternative of `table` against `profile`.
pub fn coalition_strengths<C: CoalitionValue + ?Sized>(
    table: &NormalTable,
    profile: &[f64],
    importance: &C,
) -> Vec<f64> {
    table
        .rows()
        .iter()
        .map(|row| importance.coalition_value(coalition(row, profile)))
        .collect()
}

/// Reflexive `|A| x |A|` outranking matrix of `table` under one profile.
pub fn profile_outranking<C: CoalitionValue + ?Sized>(
    table: &NormalTable,
    profile: &[f64],
    importance: &C,
) -> OutrankingMatrix {
    let strengths = coalition_strengths(table, profile, importance);
    OutrankingMatrix::from_fn((0..table.len()).collect(), |i, j| {
        strengths[i] >= strengths[j]
    })
}

/// Merges per-profile matrices following `order` into a dense ranking.
///
/// `score[i][j] = sum_step 2^(k-1-step) * matrices[order[step]][i][j]`;
/// `i` beats-or-ties `j` iff `score[i][j] >= score[j][i]`. The number of
/// alternatives each one beats-or-ties is its score for dense ranking.
///
/// `order` must be a permutation of `0..matrices.len()` with fewer than 64
/// entries; callers validate this.
pub fn lexicographic_ranking(matrices: &[OutrankingMatrix], order: &[usize]) -> Ranking {
    let n = matrices.first().map_or(0, OutrankingMatrix::size);
    let k = order.len();
    let mut score = vec![0u64; n * n];
    for (step, &profile) in order.iter().enumerate() {
        let bit = 1u64 << (k - 1 - step);
        let m = &matrices[profile];
        for i in 0..n {
            for j in 0..n {
                if m.get(i, j) {
                    score[i * n + j] += bit;
                }
            }
        }
    }
    let counts: Vec<usize> = (0..n)
        .map(|i| (0..n).filter(|&j| score[i * n + j] >= score[j * n + i]).count())
        .collect();
    let elements: Vec<usize> = (0..n).collect();
    Ranking::from_scores(&elements, &counts)
}
