//! Dense linear solver: Gaussian elimination with partial pivoting.
//!
//! Used by the polynomial fitter to solve the normal equations. Systems
//! here are tiny (order at most 13), so a straightforward row-major
//! square matrix is all that is needed.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Errors from [`solve`].
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SolveError {
    /// The right-hand side length differs from the matrix order.
    #[error("right-hand side has {rhs_len} entries, matrix order is {order}")]
    DimensionMismatch {
        /// Order of the square matrix.
        order: usize,
        /// Length of the right-hand side vector.
        rhs_len: usize,
    },

    /// Rows passed to [`Matrix::from_rows`] do not form a square matrix.
    #[error("matrix is not square: row {row} has {len} entries, expected {order}")]
    NotSquare {
        /// Number of rows, which every row length must match.
        order: usize,
        /// Index of the first offending row.
        row: usize,
        /// Length of that row.
        len: usize,
    },

    /// No usable pivot in `column`: it is exactly zero or NaN.
    #[error("matrix is singular (no usable pivot in column {column})")]
    Singular {
        /// Elimination column where the pivot vanished.
        column: usize,
    },

    /// Back-substitution produced NaN or infinity.
    #[error("solution contains non-finite values")]
    NonFinite,
}

/// A square matrix of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    order: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// An `order x order` matrix of zeros.
    #[must_use]
    pub fn zeros(order: usize) -> Self {
        Self {
            order,
            data: vec![0.0; order * order],
        }
    }

    /// Build a matrix from its rows.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::NotSquare`] if any row's length differs from
    /// the number of rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SolveError> {
        let order = rows.len();
        let mut data = Vec::with_capacity(order * order);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != order {
                return Err(SolveError::NotSquare {
                    order,
                    row,
                    len: values.len(),
                });
            }
            data.extend_from_slice(values);
        }
        Ok(Self { order, data })
    }

    /// Number of rows (and columns).
    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.order {
            self.data.swap(a * self.order + col, b * self.order + col);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.order + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[row * self.order + col]
    }
}

/// Solve `a * x = b`.
///
/// At each step `i` the row at or below `i` with the largest magnitude in
/// column `i` is swapped into place (with its `b` entry), column `i` is
/// eliminated from the rows below, and the upper-triangular system is
/// back-substituted from the last row up.
///
/// Only an exactly zero or NaN pivot is singular. Tiny pivots are kept;
/// if they blow the solution up, the final finite check reports it.
///
/// # Errors
///
/// Returns [`SolveError::DimensionMismatch`] if `b` does not have
/// `a.order()` entries, [`SolveError::Singular`] if a pivot vanishes, and
/// [`SolveError::NonFinite`] if the solution is not finite.
pub fn solve(mut a: Matrix, mut b: Vec<f64>) -> Result<Vec<f64>, SolveError> {
    let n = a.order();
    if b.len() != n {
        return Err(SolveError::DimensionMismatch {
            order: n,
            rhs_len: b.len(),
        });
    }

    for i in 0..n {
        let mut pivot_row = i;
        let mut pivot_abs = a[(i, i)].abs();
        for row in (i + 1)..n {
            let v = a[(row, i)].abs();
            if v > pivot_abs {
                pivot_abs = v;
                pivot_row = row;
            }
        }
        if pivot_abs.is_nan() || pivot_abs == 0.0 {
            return Err(SolveError::Singular { column: i });
        }

        a.swap_rows(i, pivot_row);
        b.swap(i, pivot_row);

        for row in (i + 1)..n {
            let factor = a[(row, i)] / a[(i, i)];
            if factor == 0.0 {
                continue;
            }
            for col in i..n {
                let delta = factor * a[(i, col)];
                a[(row, col)] -= delta;
            }
            let delta = factor * b[i];
            b[row] -= delta;
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for col in (i + 1)..n {
            sum -= a[(i, col)] * x[col];
        }
        x[i] = sum / a[(i, i)];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(SolveError::NonFinite)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "got {actual:?}, expected {expected:?}");
        }
    }

    #[test]
    fn identity_returns_rhs() {
        let a = Matrix::from_rows(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let x = solve(a, vec![3.0, -2.0, 7.5]).unwrap();
        assert_close(&x, &[3.0, -2.0, 7.5], 1e-12);
    }

    #[test]
    fn solves_three_by_three() {
        //  2x +  y -  z =   8
        // -3x -  y + 2z = -11
        // -2x +  y + 2z =  -3
        let a = Matrix::from_rows(&[
            vec![2.0, 1.0, -1.0],
            vec![-3.0, -1.0, 2.0],
            vec![-2.0, 1.0, 2.0],
        ])
        .unwrap();
        let x = solve(a, vec![8.0, -11.0, -3.0]).unwrap();
        assert_close(&x, &[2.0, 3.0, -1.0], 1e-10);
    }

    #[test]
    fn zero_leading_entry_needs_pivoting() {
        // Without a row swap the first pivot would be 0.
        let a = Matrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let x = solve(a, vec![4.0, 9.0]).unwrap();
        assert_close(&x, &[9.0, 4.0], 1e-12);
    }

    #[test]
    fn tiny_leading_entry_is_stable_with_pivoting() {
        // Classic example where naive elimination loses all precision.
        let a = Matrix::from_rows(&[vec![1e-20, 1.0], vec![1.0, 1.0]]).unwrap();
        let x = solve(a, vec![1.0, 2.0]).unwrap();
        assert_close(&x, &[1.0, 1.0], 1e-9);
    }

    #[test]
    fn ill_conditioned_hilbert_system_still_solves() {
        // Order 13 Hilbert matrix: late pivots are far below EPSILON * max|a|
        // but nonzero, so elimination must carry on.
        let n: u32 = 13;
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| 1.0 / f64::from(i + j + 1)).collect())
            .collect();
        let b: Vec<f64> = rows.iter().map(|row| row.iter().sum()).collect();
        let a = Matrix::from_rows(&rows).unwrap();

        let x = solve(a, b.clone()).unwrap();
        assert!(x.iter().all(|v| v.is_finite()));
        for (row, rhs) in rows.iter().zip(&b) {
            let lhs: f64 = row.iter().zip(&x).map(|(h, v)| h * v).sum();
            assert!((lhs - rhs).abs() < 1e-6, "residual {}", lhs - rhs);
        }
    }

    #[test]
    fn singular_matrix_is_reported() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let err = solve(a, vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err, SolveError::Singular { column: 1 });
    }

    #[test]
    fn zero_matrix_is_singular_at_first_column() {
        let err = solve(Matrix::zeros(3), vec![0.0; 3]).unwrap_err();
        assert_eq!(err, SolveError::Singular { column: 0 });
    }

    #[test]
    fn nan_entries_are_reported() {
        let a = Matrix::from_rows(&[vec![f64::NAN, 0.0], vec![0.0, 1.0]]).unwrap();
        assert!(solve(a, vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn infinite_rhs_is_non_finite() {
        let a = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let err = solve(a, vec![f64::INFINITY, 1.0]).unwrap_err();
        assert_eq!(err, SolveError::NonFinite);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let err = solve(Matrix::zeros(2), vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            SolveError::DimensionMismatch {
                order: 2,
                rhs_len: 1
            }
        );
    }

    #[test]
    fn empty_system_has_empty_solution() {
        let x = solve(Matrix::zeros(0), Vec::new()).unwrap();
        assert!(x.is_empty());
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            SolveError::NotSquare {
                order: 2,
                row: 1,
                len: 1
            }
        );
    }

    #[test]
    fn indexing_is_row_major() {
        let mut m = Matrix::zeros(2);
        m[(0, 1)] = 5.0;
        m[(1, 0)] = -1.0;
        let expected = Matrix::from_rows(&[vec![0.0, 5.0], vec![-1.0, 0.0]]).unwrap();
        assert_eq!(m, expected);
        assert_eq!(m.order(), 2);
    }
}
