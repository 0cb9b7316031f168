//! Binary outranking matrices.

use crate::error::{Result, SrmpError};

/// Square 0/1 "at least as good as" matrix over a set of elements.
///
/// Cell `(i, j)` is `true` when the element at position `i` outranks the
/// element at position `j`. The diagonal is always `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutrankingMatrix {
    elements: Vec<usize>,
    cells: Vec<bool>,
}

impl OutrankingMatrix {
    /// Identity matrix: every element only outranks itself.
    pub fn identity(elements: Vec<usize>) -> Self {
        let n = elements.len();
        let mut cells = vec![false; n * n];
        for i in 0..n {
            cells[i * n + i] = true;
        }
        Self { elements, cells }
    }

    /// Builds a matrix cell by cell; the diagonal is forced to `true`.
    pub fn from_fn(elements: Vec<usize>, mut outranks: impl FnMut(usize, usize) -> bool) -> Self {
        let n = elements.len();
        let mut cells = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                cells.push(i == j || outranks(i, j));
            }
        }
        Self { elements, cells }
    }

    /// Builds a matrix from explicit rows; the diagonal is forced to `true`.
    pub fn from_rows(elements: Vec<usize>, rows: Vec<Vec<bool>>) -> Result<Self> {
        let n = elements.len();
        if rows.len() != n || rows.iter().any(|r| r.len() != n) {
            return Err(SrmpError::ShapeMismatch(format!(
                "outranking matrix over {n} elements needs {n}x{n} cells"
            )));
        }
        let mut m = Self {
            elements,
            cells: rows.into_iter().flatten().collect(),
        };
        for i in 0..n {
            m.set(i, i, true);
        }
        Ok(m)
    }

    pub fn elements(&self) -> &[usize] {
        &self.elements
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Position of `element` in the matrix.
    pub fn position(&self, element: usize) -> Option<usize> {
        self.elements.iter().position(|&e| e == element)
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.size() + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        let n = self.size();
        self.cells[i * n + j] = value || i == j;
    }

    /// Number of elements each row outranks (itself included).
    pub fn row_counts(&self) -> Vec<usize> {
        let n = self.size();
        self.cells
            .chunks(n.max(1))
            .take(n)
            .map(|row| row.iter().filter(|&&c| c).count())
            .collect()
    }

    /// Warshall closure.
    pub fn transitive_closure(&self) -> Self {
        let n = self.size();
        let mut m = self.clone();
        for k in 0..n {
            for i in 0..n {
                if !m.get(i, k) {
                    continue;
                }
                for j in 0..n {
                    if m.get(k, j) {
                        m.cells[i * n + j] = true;
                    }
                }
            }
        }
        m
    }

    /// Removes every strict edge implied by a path through a third element
    /// that is equivalent to neither endpoint. Edges inside an
    /// equivalence class are kept.
    pub fn transitive_reduction(&self) -> Self {
        let n = self.size();
        let closure = self.transitive_closure();
        let equivalent = |a: usize, b: usize| closure.get(a, b) && closure.get(b, a);
        let mut m = closure.clone();
        for i in 0..n {
            for j in 0..n {
                if i == j || !closure.get(i, j) || equivalent(i, j) {
                    continue;
                }
                let implied = (0..n).any(|k| {
                    !equivalent(k, i)
                        && !equivalent(k, j)
                        && closure.get(i, k)
                        && closure.get(k, j)
                });
                if implied {
                    m.cells[i * n + j] = false;
                }
            }
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> OutrankingMatrix {
        // 0 >= 1 >= 2
        OutrankingMatrix::from_rows(
            vec![0, 1, 2],
            vec![
                vec![false, true, false],
                vec![false, false, true],
                vec![false, false, false],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_diagonal_forced() {
        let m = chain();
        assert!((0..3).all(|i| m.get(i, i)));
        let mut m = m;
        m.set(1, 1, false);
        assert!(m.get(1, 1));
    }

    #[test]
    fn test_shape_checked() {
        assert!(OutrankingMatrix::from_rows(vec![0, 1], vec![vec![true]]).is_err());
    }

    #[test]
    fn test_closure() {
        let c = chain().transitive_closure();
        assert!(c.get(0, 2));
        assert!(!c.get(2, 0));
        assert_eq!(c.row_counts(), vec![3, 2, 1]);
    }

    #[test]
    fn test_reduction_inverts_closure_on_chain() {
        let c = chain().transitive_closure();
        assert_eq!(c.transitive_reduction(), chain());
    }

    #[test]
    fn test_reduction_keeps_equivalence_class() {
        // 0 ~ 1, both >= 2
        let m = OutrankingMatrix::from_rows(
            vec![0, 1, 2],
            vec![
                vec![true, true, true],
                vec![true, true, true],
                vec![false, false, true],
            ],
        )
        .unwrap();
        let r = m.transitive_reduction();
        assert!(r.get(0, 1) && r.get(1, 0));
        assert!(r.get(0, 2) && r.get(1, 2));
    }
}
