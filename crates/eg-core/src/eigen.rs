//! Numeric eigensolvers.
//!
//! Both matrix kinds have spectra on a single axis, so a solver returns one
//! real number per eigenvalue: the real part for symmetric matrices, the
//! imaginary part for skew-symmetric ones. A real skew matrix A is solved
//! through the Hermitian matrix iA, whose real eigenvalues h give λ = −ih.

use std::fmt;
use std::thread;

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex;

use crate::constants::OFFLOAD_THRESHOLD;
use crate::graph::MatrixKind;

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    NotSquare { rows: usize, cols: usize },
    NoConvergence { n: usize },
    NonFinite,
    Worker(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::NotSquare { rows, cols } => {
                write!(f, "matrix is not square ({rows}x{cols})")
            }
            SolveError::NoConvergence { n } => {
                write!(f, "eigensolver did not converge on {n}x{n} matrix")
            }
            SolveError::NonFinite => write!(f, "eigensolver produced non-finite values"),
            SolveError::Worker(msg) => write!(f, "solver worker failed: {msg}"),
        }
    }
}

impl std::error::Error for SolveError {}

/// Pluggable eigenvalue capability. Returns axis values in ascending order.
pub trait EigenSolver {
    fn solve(&self, matrix: &[Vec<i64>], kind: MatrixKind) -> Result<Vec<f64>, SolveError>;
}

/// In-process solver on nalgebra's symmetric/Hermitian eigendecomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSolver;

impl EigenSolver for DirectSolver {
    fn solve(&self, matrix: &[Vec<i64>], kind: MatrixKind) -> Result<Vec<f64>, SolveError> {
        let n = matrix.len();
        if let Some(row) = matrix.iter().find(|row| row.len() != n) {
            return Err(SolveError::NotSquare {
                rows: n,
                cols: row.len(),
            });
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut values: Vec<f64> = match kind {
            MatrixKind::Symmetric => {
                let m = DMatrix::<f64>::from_fn(n, n, |i, j| matrix[i][j] as f64);
                SymmetricEigen::try_new(m, f64::EPSILON, 0)
                    .ok_or(SolveError::NoConvergence { n })?
                    .eigenvalues
                    .iter()
                    .copied()
                    .collect()
            }
            MatrixKind::Skew => {
                let h = DMatrix::<Complex<f64>>::from_fn(n, n, |i, j| {
                    Complex::new(0.0, matrix[i][j] as f64)
                });
                SymmetricEigen::try_new(h, f64::EPSILON, 0)
                    .ok_or(SolveError::NoConvergence { n })?
                    .eigenvalues
                    .iter()
                    .map(|&h| -h)
                    .collect()
            }
        };
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SolveError::NonFinite);
        }
        for v in &mut values {
            if v.abs() < 1e-12 {
                *v = 0.0;
            }
        }
        values.sort_by(f64::total_cmp);
        Ok(values)
    }
}

/// Offloads matrices at or above `threshold` to a scoped worker thread.
///
/// The worker runs the same direct computation, so results are identical to
/// [`DirectSolver`]; only the calling thread's blocking profile changes.
#[derive(Debug, Clone, Copy)]
pub struct TieredSolver {
    threshold: usize,
}

impl TieredSolver {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for TieredSolver {
    fn default() -> Self {
        Self::new(OFFLOAD_THRESHOLD)
    }
}

impl EigenSolver for TieredSolver {
    fn solve(&self, matrix: &[Vec<i64>], kind: MatrixKind) -> Result<Vec<f64>, SolveError> {
        if matrix.len() < self.threshold {
            return DirectSolver.solve(matrix, kind);
        }
        thread::scope(|scope| {
            scope
                .spawn(|| DirectSolver.solve(matrix, kind))
                .join()
                .map_err(|_| SolveError::Worker("eigensolver thread panicked".into()))?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use approx::assert_abs_diff_eq;

    fn complete(n: usize) -> Graph {
        Graph::new(n, (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))).unwrap()
    }

    #[test]
    fn test_symmetric_triangle() {
        let values = DirectSolver
            .solve(&complete(3).symmetric_adjacency(), MatrixKind::Symmetric)
            .unwrap();
        for (v, e) in values.iter().zip([-1.0, -1.0, 2.0]) {
            assert_abs_diff_eq!(*v, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_skew_path_is_imaginary() {
        let p3 = Graph::new(3, [(0, 1), (1, 2)]).unwrap();
        let values = DirectSolver.solve(&p3.skew_adjacency(), MatrixKind::Skew).unwrap();
        let s = 2f64.sqrt();
        for (v, e) in values.iter().zip([-s, 0.0, s]) {
            assert_abs_diff_eq!(*v, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_skew_k4_cotangents() {
        let values = DirectSolver
            .solve(&complete(4).skew_adjacency(), MatrixKind::Skew)
            .unwrap();
        let c1 = 1.0 / (std::f64::consts::PI / 8.0).tan();
        let c3 = 1.0 / (3.0 * std::f64::consts::PI / 8.0).tan();
        for (v, e) in values.iter().zip([-c1, -c3, c3, c1]) {
            assert_abs_diff_eq!(*v, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tiered_matches_direct() {
        let g = complete(9);
        let tiered = TieredSolver::new(4);
        for kind in [MatrixKind::Skew, MatrixKind::Symmetric] {
            let m = match kind {
                MatrixKind::Skew => g.skew_adjacency(),
                MatrixKind::Symmetric => g.symmetric_adjacency(),
            };
            assert_eq!(tiered.solve(&m, kind), DirectSolver.solve(&m, kind));
        }
    }

    #[test]
    fn test_empty_and_ragged() {
        assert_eq!(DirectSolver.solve(&[], MatrixKind::Skew), Ok(Vec::new()));
        let ragged = vec![vec![0, 1], vec![0]];
        assert!(matches!(
            DirectSolver.solve(&ragged, MatrixKind::Symmetric),
            Err(SolveError::NotSquare { .. })
        ));
    }
}
