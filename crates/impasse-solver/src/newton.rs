//! Newton search direction.
//!
//! Solves `H d = -∇f` with the sparse LLᵀ from `impasse-math`. Fixed
//! dofs are pinned: their rows and columns are replaced by the identity
//! and their right-hand side by zero, so `dᵢ = 0` for every fixed `i`.
//! Step length selection is left to the caller.

use impasse_math::faer_solver::FaerSolver;
use impasse_math::sparse::{CsrMatrix, SparseSolver};
use impasse_types::{ImpasseError, ImpasseResult};

use crate::problem::UnconstrainedProblem;

/// Smallest diagonal shift tried when the hessian is not positive definite.
const INITIAL_REGULARIZATION: f64 = 1e-8;

/// Growth factor between successive shifts.
const REGULARIZATION_GROWTH: f64 = 10.0;

const MAX_REGULARIZATION_ATTEMPTS: usize = 16;

/// A Newton direction and the diagonal shift needed to compute it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonDirection {
    pub direction: Vec<f64>,
    pub gradient: Vec<f64>,
    /// `0` when the hessian factorized as is.
    pub regularization: f64,
}

impl NewtonDirection {
    /// `∇fᵀ d`; negative for a descent direction.
    pub fn directional_derivative(&self) -> f64 {
        self.gradient
            .iter()
            .zip(&self.direction)
            .map(|(g, d)| g * d)
            .sum()
    }
}

/// Computes the Newton direction of `problem` at `x`.
pub fn newton_direction(
    problem: &dyn UnconstrainedProblem,
    x: &[f64],
    is_dof_fixed: &[bool],
) -> ImpasseResult<NewtonDirection> {
    let n = x.len();
    if is_dof_fixed.len() != n {
        return Err(ImpasseError::DimensionMismatch {
            what: "fixed dof mask",
            expected: n,
            found: is_dof_fixed.len(),
        });
    }

    let gradient = problem.eval_grad_f(x)?;
    let hessian = problem.eval_hessian_f(x)?;
    if hessian.rows != n || hessian.cols != n || gradient.len() != n {
        return Err(ImpasseError::DimensionMismatch {
            what: "newton system",
            expected: n,
            found: hessian.rows.max(hessian.cols).max(gradient.len()),
        });
    }
    if n == 0 {
        return Ok(NewtonDirection {
            direction: Vec::new(),
            gradient,
            regularization: 0.0,
        });
    }

    let rhs: Vec<f64> = gradient
        .iter()
        .zip(is_dof_fixed)
        .map(|(&g, &fixed)| if fixed { 0.0 } else { -g })
        .collect();

    let scale = hessian
        .triplets()
        .filter(|(i, j, _)| i == j)
        .fold(1.0_f64, |acc, (_, _, v)| acc.max(v.abs()));

    let mut solver = FaerSolver::new();
    let mut regularization = 0.0;
    let mut last_error = None;
    for attempt in 0..=MAX_REGULARIZATION_ATTEMPTS {
        let system = pinned_system(&hessian, is_dof_fixed, regularization);
        match solver.factorize(&system) {
            Ok(()) => {
                let mut direction = vec![0.0; n];
                solver.solve(&rhs, &mut direction)?;
                if attempt > 0 {
                    tracing::debug!(regularization, attempt, "Regularized Newton system");
                }
                return Ok(NewtonDirection {
                    direction,
                    gradient,
                    regularization,
                });
            }
            Err(e) => {
                tracing::trace!(regularization, error = %e, "Newton system not positive definite");
                regularization = if regularization == 0.0 {
                    INITIAL_REGULARIZATION * scale
                } else {
                    regularization * REGULARIZATION_GROWTH
                };
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ImpasseError::Factorization("Newton system".into())))
}

/// `H + μI` restricted to the free dofs, identity on the fixed ones.
fn pinned_system(hessian: &CsrMatrix, is_dof_fixed: &[bool], shift: f64) -> CsrMatrix {
    let n = hessian.rows;
    let mut triplets: Vec<_> = hessian
        .triplets()
        .filter(|&(i, j, _)| !is_dof_fixed[i] && !is_dof_fixed[j])
        .collect();
    for (i, &fixed) in is_dof_fixed.iter().enumerate() {
        triplets.push((i, i, if fixed { 1.0 } else { shift }));
    }
    CsrMatrix::from_triplets(n, n, &triplets)
}
