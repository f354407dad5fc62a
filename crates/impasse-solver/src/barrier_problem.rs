//! Barrier-weighted objective.
//!
//! `f(x) = E(x) + κ Σ_{k ∈ C} b(d(x_k))`: an energy term plus the
//! contact barrier scaled by the stiffness κ. The problem is
//! unconstrained from the solver's point of view; contacts only enter
//! through the barrier.

use impasse_body::poses_to_dofs;
use impasse_math::dense::DenseMatrix;
use impasse_math::finite_diff::{finite_gradient, finite_jacobian};
use impasse_math::sparse::CsrMatrix;
use impasse_types::{ImpasseError, ImpasseResult};

use crate::barrier_term::DistanceBarrierTerm;
use crate::config::BarrierProblemConfig;
use crate::problem::{
    BarrierObjectiveProblem, Capabilities, Capability, Objective, UnconstrainedProblem,
};
use crate::term::{ObjectiveTerm, TermEvaluation};

/// Energy plus κ-weighted contact barrier over the dofs of a set of
/// rigid bodies.
pub struct BarrierProblem {
    name: String,
    config: BarrierProblemConfig,
    x0: Vec<f64>,
    is_dof_fixed: Vec<bool>,
    energy: Box<dyn ObjectiveTerm>,
    barrier: DistanceBarrierTerm,
}

impl BarrierProblem {
    /// Creates the problem and initializes the barrier constraint.
    ///
    /// The starting point is the rest configuration of the bodies.
    pub fn new(
        energy: Box<dyn ObjectiveTerm>,
        barrier: DistanceBarrierTerm,
        config: BarrierProblemConfig,
    ) -> ImpasseResult<Self> {
        config.validate()?;
        let mut barrier = barrier.with_finite_difference_step(config.finite_difference_step);
        barrier.initialize();

        let bodies = barrier.bodies();
        let x0 = poses_to_dofs(&bodies.rest_poses(), bodies.dim())?;
        let is_dof_fixed = bodies.is_dof_fixed();

        tracing::debug!(
            num_vars = x0.len(),
            num_bodies = bodies.num_bodies(),
            kappa = config.barrier_stiffness,
            energy = energy.name(),
            "Created barrier problem"
        );

        Ok(Self {
            name: "barrier_problem".to_string(),
            config,
            x0,
            is_dof_fixed,
            energy,
            barrier,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_starting_point(mut self, x0: Vec<f64>) -> ImpasseResult<Self> {
        if x0.len() != self.x0.len() {
            return Err(ImpasseError::DimensionMismatch {
                what: "starting point",
                expected: self.x0.len(),
                found: x0.len(),
            });
        }
        self.x0 = x0;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BarrierProblemConfig {
        &self.config
    }

    pub fn energy_term(&self) -> &dyn ObjectiveTerm {
        self.energy.as_ref()
    }

    pub fn barrier_term(&self) -> &DistanceBarrierTerm {
        &self.barrier
    }

    pub fn barrier_term_mut(&mut self) -> &mut DistanceBarrierTerm {
        &mut self.barrier
    }

    /// κ.
    pub fn barrier_stiffness(&self) -> f64 {
        self.config.barrier_stiffness
    }

    pub fn set_barrier_stiffness(&mut self, kappa: f64) {
        self.config.barrier_stiffness = kappa;
    }

    /// Sets d̂ on the barrier constraint.
    pub fn set_barrier_epsilon(&mut self, epsilon: f64) {
        self.barrier
            .constraint_mut()
            .set_barrier_activation_distance(epsilon);
    }

    /// Earliest time of impact moving from `x_i` to `x_j`.
    pub fn earliest_toi(&self, x_i: &[f64], x_j: &[f64]) -> ImpasseResult<f64> {
        self.barrier.earliest_toi(x_i, x_j)
    }

    // ─── Terms ───────────────────────────────────────────────

    /// `E(x)` with the requested derivatives.
    pub fn compute_energy_term(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<TermEvaluation> {
        self.energy.evaluate(x, want_grad, want_hess)
    }

    /// `B(x)` with the requested derivatives and the number of active
    /// constraints.
    pub fn compute_barrier_term(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<(TermEvaluation, usize)> {
        self.barrier.evaluate_counted(x, want_grad, want_hess)
    }

    /// `E + κB` with `∇E + κ∇B` and `∇²E + κ∇²B` when requested.
    ///
    /// A term that does not supply a requested derivative makes the
    /// whole evaluation fail with [`ImpasseError::Unimplemented`].
    pub fn compute_objective(
        &self,
        x: &[f64],
        want_grad: bool,
        want_hess: bool,
    ) -> ImpasseResult<Objective> {
        let energy = self.compute_energy_term(x, want_grad, want_hess)?;
        let (barrier, num_constraints) = self.compute_barrier_term(x, want_grad, want_hess)?;
        let kappa = self.barrier_stiffness();

        let gradient = if want_grad {
            let ge = energy
                .gradient
                .ok_or(ImpasseError::Unimplemented("energy gradient"))?;
            let gb = barrier
                .gradient
                .ok_or(ImpasseError::Unimplemented("barrier gradient"))?;
            Some(combine_gradients(&ge, &gb, kappa)?)
        } else {
            None
        };
        let hessian = if want_hess {
            let he = energy
                .hessian
                .ok_or(ImpasseError::Unimplemented("energy hessian"))?;
            let hb = barrier
                .hessian
                .ok_or(ImpasseError::Unimplemented("barrier hessian"))?;
            Some(he.add(&hb.scale(kappa))?)
        } else {
            None
        };

        let value = energy.value + kappa * barrier.value;
        tracing::trace!(
            value,
            energy = energy.value,
            barrier = barrier.value,
            num_constraints,
            "Objective"
        );

        Ok(Objective {
            value,
            gradient,
            hessian,
            num_constraints,
        })
    }
}

fn combine_gradients(energy: &[f64], barrier: &[f64], kappa: f64) -> ImpasseResult<Vec<f64>> {
    if energy.len() != barrier.len() {
        return Err(ImpasseError::DimensionMismatch {
            what: "barrier gradient",
            expected: energy.len(),
            found: barrier.len(),
        });
    }
    Ok(energy.iter().zip(barrier).map(|(ge, gb)| ge + kappa * gb).collect())
}

impl UnconstrainedProblem for BarrierProblem {
    fn num_vars(&self) -> usize {
        self.x0.len()
    }

    fn starting_point(&self) -> &[f64] {
        &self.x0
    }

    fn eval_f(&self, x: &[f64]) -> ImpasseResult<f64> {
        Ok(self.compute_objective(x, false, false)?.value)
    }

    fn eval_grad_f(&self, x: &[f64]) -> ImpasseResult<Vec<f64>> {
        self.compute_objective(x, true, false)?
            .gradient
            .ok_or(ImpasseError::Unimplemented("eval_grad_f"))
    }

    fn eval_hessian_f(&self, x: &[f64]) -> ImpasseResult<CsrMatrix> {
        self.compute_objective(x, false, true)?
            .hessian
            .ok_or(ImpasseError::Unimplemented("eval_hessian_f"))
    }

    fn capabilities(&self) -> Capabilities {
        let caps = Capabilities::NONE
            .with(Capability::Unconstrained)
            .with(Capability::Barrier);
        if self.energy.provides_hessian() && self.barrier.provides_hessian() {
            caps.with(Capability::HessianF)
        } else {
            caps
        }
    }

    fn as_barrier(&self) -> Option<&dyn BarrierObjectiveProblem> {
        Some(self)
    }
}

impl BarrierObjectiveProblem for BarrierProblem {
    fn eval_f_and_fdiff(&self, x: &[f64], want_hessian: bool) -> ImpasseResult<Objective> {
        self.compute_objective(x, true, want_hessian)
    }

    fn barrier_epsilon(&self) -> f64 {
        self.barrier.constraint().barrier_activation_distance()
    }

    fn is_dof_fixed(&self) -> &[bool] {
        &self.is_dof_fixed
    }

    fn has_collisions(&self, x_i: &[f64], x_j: &[f64]) -> ImpasseResult<bool> {
        self.barrier.has_collisions(x_i, x_j)
    }

    fn termination_threshold(&self) -> f64 {
        self.config.termination_threshold
    }

    fn eval_grad_energy(&self, x: &[f64]) -> ImpasseResult<Vec<f64>> {
        self.compute_energy_term(x, true, false)?
            .gradient
            .ok_or(ImpasseError::Unimplemented("energy gradient"))
    }

    fn eval_grad_barrier(&self, x: &[f64]) -> ImpasseResult<(Vec<f64>, usize)> {
        let (barrier, num_constraints) = self.compute_barrier_term(x, true, false)?;
        let gradient = barrier
            .gradient
            .ok_or(ImpasseError::Unimplemented("barrier gradient"))?;
        Ok((gradient, num_constraints))
    }

    fn debug_min_distance(&self, x: &[f64]) -> ImpasseResult<f64> {
        self.barrier.min_distance(x)
    }
}

// ─── Finite-difference checks ────────────────────────────────

/// Gradient of the energy term by central differences.
pub fn eval_grad_energy_approx(problem: &BarrierProblem, x: &[f64]) -> ImpasseResult<Vec<f64>> {
    problem.compute_energy_term(x, false, false)?;
    Ok(finite_gradient(
        x,
        |xk| {
            problem
                .compute_energy_term(xk, false, false)
                .map_or(f64::NAN, |e| e.value)
        },
        problem.config.finite_difference_step,
    ))
}

/// Hessian of the energy term as the central-difference jacobian of its
/// analytic gradient.
pub fn eval_hess_energy_approx(
    problem: &BarrierProblem,
    x: &[f64],
) -> ImpasseResult<DenseMatrix> {
    problem.compute_energy_term(x, true, false)?;
    Ok(finite_jacobian(
        x,
        |xk| {
            problem
                .compute_energy_term(xk, true, false)
                .ok()
                .and_then(|e| e.gradient)
                .unwrap_or_else(|| vec![f64::NAN; xk.len()])
        },
        problem.config.finite_difference_step,
    ))
}
