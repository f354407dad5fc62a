//! Sparse Cholesky solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait using faer's supernodal LLᵀ
//! factorization.
//!
//! ## Workflow
//! 1. `factorize(matrix)` converts CSR to CSC, then computes symbolic + numeric LLᵀ
//! 2. `solve(rhs, solution)` runs forward/backward substitution
//! 3. Repeat `solve()` with different RHS without re-factorizing

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;
use faer::Side;

use impasse_types::{ImpasseError, ImpasseResult};

use crate::sparse::{CsrMatrix, SparseSolver};

/// Sparse Cholesky (LLᵀ) solver using `faer`.
///
/// Stores the factorization for reuse across multiple solves.
pub struct FaerSolver {
    factorization: Option<Llt<usize, f64>>,
    dimension: usize,
}

impl FaerSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }

    /// Convert our CSR matrix to faer's CSC matrix.
    fn csr_to_csc(matrix: &CsrMatrix) -> ImpasseResult<SparseColMat<usize, f64>> {
        let triplets: Vec<Triplet<usize, usize, f64>> = matrix
            .triplets()
            .map(|(row, col, val)| Triplet { row, col, val })
            .collect();

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets).map_err(|e| {
            ImpasseError::Factorization(format!("Failed to construct faer CSC matrix: {e:?}"))
        })
    }
}

impl Default for FaerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> ImpasseResult<()> {
        if matrix.rows != matrix.cols {
            return Err(ImpasseError::Factorization(format!(
                "Matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        if matrix.rows == 0 {
            return Err(ImpasseError::Factorization(
                "Cannot factorize empty matrix".into(),
            ));
        }

        self.factorization = None;
        self.dimension = matrix.rows;

        let csc = Self::csr_to_csc(matrix)?;

        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| ImpasseError::Factorization(format!("Symbolic analysis failed: {e:?}")))?;

        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper).map_err(|e| {
            ImpasseError::Factorization(format!("Cholesky factorization failed: {e:?}"))
        })?;

        self.factorization = Some(llt);
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> ImpasseResult<()> {
        let llt = self.factorization.as_ref().ok_or_else(|| {
            ImpasseError::Factorization("Solver not factorized. Call factorize() first.".into())
        })?;

        for (what, len) in [("rhs", rhs.len()), ("solution", solution.len())] {
            if len != self.dimension {
                return Err(ImpasseError::DimensionMismatch {
                    what,
                    expected: self.dimension,
                    found: len,
                });
            }
        }

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let sol = llt.solve(&rhs_mat);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = sol[(i, 0)];
        }
        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}
