//! Objective terms.
//!
//! A term is one additive piece of the objective, evaluated with only
//! the derivatives the caller asks for.

use impasse_body::{poses_to_dofs, Pose, RigidBodyAssembler};
use impasse_math::sparse::CsrMatrix;
use impasse_types::{ImpasseError, ImpasseResult};

/// Value of a term with the requested derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct TermEvaluation {
    pub value: f64,
    pub gradient: Option<Vec<f64>>,
    pub hessian: Option<CsrMatrix>,
}

impl TermEvaluation {
    /// A term that contributes nothing over `n` dofs.
    pub fn zero(n: usize, want_grad: bool, want_hess: bool) -> Self {
        Self {
            value: 0.0,
            gradient: want_grad.then(|| vec![0.0; n]),
            hessian: want_hess.then(|| CsrMatrix::new(n, n)),
        }
    }
}

/// One additive piece of an objective.
pub trait ObjectiveTerm: Send + Sync {
    /// Evaluates the term at `x`. The gradient and hessian are only
    /// computed when requested.
    fn evaluate(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<TermEvaluation>;

    /// False if `evaluate` never returns a hessian.
    fn provides_hessian(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Mass-weighted distance to a target configuration:
/// `½ Σ mᵢ (xᵢ - x̂ᵢ)²`.
#[derive(Debug, Clone, PartialEq)]
pub struct InertialEnergy {
    masses: Vec<f64>,
    target: Vec<f64>,
}

impl InertialEnergy {
    pub fn new(masses: Vec<f64>, target: Vec<f64>) -> ImpasseResult<Self> {
        if masses.len() != target.len() {
            return Err(ImpasseError::DimensionMismatch {
                what: "inertial masses",
                expected: target.len(),
                found: masses.len(),
            });
        }
        Ok(Self { masses, target })
    }

    /// Same mass on every dof.
    pub fn uniform(mass: f64, target: Vec<f64>) -> Self {
        Self {
            masses: vec![mass; target.len()],
            target,
        }
    }

    /// Each body's mass on each of its dofs, pulling toward `target_poses`.
    pub fn for_bodies(bodies: &RigidBodyAssembler, target_poses: &[Pose]) -> ImpasseResult<Self> {
        bodies.check_poses(target_poses)?;
        let target = poses_to_dofs(target_poses, bodies.dim())?;
        let masses = bodies
            .bodies()
            .iter()
            .flat_map(|b| std::iter::repeat(b.mass).take(b.ndof()))
            .collect();
        Self::new(masses, target)
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }
}

impl ObjectiveTerm for InertialEnergy {
    fn evaluate(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<TermEvaluation> {
        if x.len() != self.target.len() {
            return Err(ImpasseError::DimensionMismatch {
                what: "dofs",
                expected: self.target.len(),
                found: x.len(),
            });
        }

        let mut value = 0.0;
        for ((&xi, &ti), &mi) in x.iter().zip(&self.target).zip(&self.masses) {
            let dx = xi - ti;
            value += 0.5 * mi * dx * dx;
        }

        let gradient = want_grad.then(|| {
            x.iter()
                .zip(&self.target)
                .zip(&self.masses)
                .map(|((&xi, &ti), &mi)| mi * (xi - ti))
                .collect()
        });

        let hessian = want_hess.then(|| {
            let n = x.len();
            let diagonal: Vec<_> = (0..n).map(|i| (i, i, self.masses[i])).collect();
            CsrMatrix::from_triplets(n, n, &diagonal)
        });

        Ok(TermEvaluation {
            value,
            gradient,
            hessian,
        })
    }

    fn name(&self) -> &str {
        "inertial_energy"
    }
}
