//! Sparse matrix representation and solver interface.
//!
//! Provides a CSR (Compressed Sparse Row) matrix used for objective
//! and constraint hessians, and a trait for sparse Cholesky solvers.

use impasse_types::{ImpasseError, ImpasseResult};
use serde::{Deserialize, Serialize};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. This is the standard
/// format for sparse linear algebra libraries (faer, SuiteSparse).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates an n×n identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        // Count entries per row
        let mut row_counts = vec![0usize; rows];
        for &(r, _, _) in triplets {
            row_counts[r] += 1;
        }

        let mut row_ptr = vec![0usize; rows + 1];
        for i in 0..rows {
            row_ptr[i + 1] = row_ptr[i] + row_counts[i];
        }

        let nnz = row_ptr[rows];
        let mut col_idx = vec![0usize; nnz];
        let mut values = vec![0.0f64; nnz];

        let mut cursor = row_ptr[..rows].to_vec();
        for &(r, c, v) in triplets {
            let pos = cursor[r];
            col_idx[pos] = c;
            values[pos] = v;
            cursor[r] += 1;
        }

        // Sort each row by column and merge duplicates.
        let mut out_ptr = vec![0usize; rows + 1];
        let mut out_cols = Vec::with_capacity(nnz);
        let mut out_vals = Vec::with_capacity(nnz);
        for i in 0..rows {
            let mut row: Vec<(usize, f64)> = (row_ptr[i]..row_ptr[i + 1])
                .map(|k| (col_idx[k], values[k]))
                .collect();
            row.sort_by_key(|&(c, _)| c);
            for (c, v) in row {
                if out_cols.len() > out_ptr[i] && out_cols.last() == Some(&c) {
                    if let Some(last) = out_vals.last_mut() {
                        *last += v;
                    }
                } else {
                    out_cols.push(c);
                    out_vals.push(v);
                }
            }
            out_ptr[i + 1] = out_cols.len();
        }

        Self {
            rows,
            cols,
            row_ptr: out_ptr,
            col_idx: out_cols,
            values: out_vals,
        }
    }

    /// Iterates over all stored entries as `(row, col, value)`.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |r| {
            (self.row_ptr[r]..self.row_ptr[r + 1])
                .map(move |k| (r, self.col_idx[k], self.values[k]))
        })
    }

    /// Returns the entry at (row, col), or zero if it is not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.rows {
            return 0.0;
        }
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(k) => self.values[start + k],
            Err(_) => 0.0,
        }
    }

    /// Computes `A x`.
    pub fn mul_vec(&self, x: &[f64]) -> ImpasseResult<Vec<f64>> {
        if x.len() != self.cols {
            return Err(ImpasseError::DimensionMismatch {
                what: "sparse matrix-vector product",
                expected: self.cols,
                found: x.len(),
            });
        }
        let mut out = vec![0.0; self.rows];
        for (r, out_r) in out.iter_mut().enumerate() {
            for k in self.row_ptr[r]..self.row_ptr[r + 1] {
                *out_r += self.values[k] * x[self.col_idx[k]];
            }
        }
        Ok(out)
    }

    /// Returns a copy with every entry multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        let mut scaled = self.clone();
        scaled.values.iter_mut().for_each(|v| *v *= factor);
        scaled
    }

    /// Returns `self + other`.
    pub fn add(&self, other: &CsrMatrix) -> ImpasseResult<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(ImpasseError::DimensionMismatch {
                what: "sparse matrix sum",
                expected: self.rows * self.cols,
                found: other.rows * other.cols,
            });
        }
        let triplets: Vec<_> = self.triplets().chain(other.triplets()).collect();
        Ok(Self::from_triplets(self.rows, self.cols, &triplets))
    }

    /// Expands into a row-major dense array.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.cols]; self.rows];
        for (r, c, v) in self.triplets() {
            dense[r][c] += v;
        }
        dense
    }
}

/// Trait for sparse symmetric positive-definite solvers.
pub trait SparseSolver {
    /// Factorize the matrix.
    fn factorize(&mut self, matrix: &CsrMatrix) -> ImpasseResult<()>;

    /// Solve Ax = b using the pre-computed factorization.
    /// Returns x in the provided output buffer.
    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> ImpasseResult<()>;

    /// Returns true if the solver holds a valid factorization.
    fn is_factorized(&self) -> bool;
}
