//! Optimization problem contract.
//!
//! Problems are described by capability traits. The base trait,
//! [`UnconstrainedProblem`], lets a solver probe for the richer
//! interfaces (`as_constrained`, `as_barrier`, ...) instead of calling
//! methods that might not be provided:
//!
//! ```text
//! minₓ  f(x)          x ∈ Rⁿ,  x_lower ≤ x ≤ x_upper
//!       g_lower ≤ g(x) ≤ g_upper
//! ```

use impasse_math::dense::DenseMatrix;
use impasse_math::finite_diff::{finite_gradient, finite_jacobian};
use impasse_math::sparse::CsrMatrix;
use impasse_types::constants::{DEFAULT_FINITE_DIFFERENCE_STEP, NO_LOWER_BOUND, NO_UPPER_BOUND};
use impasse_types::{ImpasseError, ImpasseResult};

// ─── Capabilities ────────────────────────────────────────────

/// One optional part of the problem contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Unconstrained,
    Constrained,
    Ncp,
    BarrierGeneral,
    Barrier,
    /// `eval_hessian_f` is available.
    HessianF,
    /// `eval_hessian_g` returns one matrix per constraint.
    HessianG,
}

impl Capability {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of [`Capability`] flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);

    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

// ─── Evaluations ─────────────────────────────────────────────

/// Objective value with optional derivatives.
///
/// Outputs that were not requested are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub value: f64,
    pub gradient: Option<Vec<f64>>,
    pub hessian: Option<CsrMatrix>,
    /// Number of contact constraints that contributed.
    pub num_constraints: usize,
}

/// Constraint values with their first and second derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintEvaluation {
    pub values: Vec<f64>,
    pub jacobian: DenseMatrix,
    pub hessians: Vec<CsrMatrix>,
}

/// Constraint values, sparse jacobian and active set of an NCP problem.
#[derive(Debug, Clone, PartialEq)]
pub struct NcpEvaluation {
    pub values: Vec<f64>,
    pub jacobian: CsrMatrix,
    pub active: Vec<usize>,
}

// ─── Capability traits ───────────────────────────────────────

/// Minimize `f(x)` with no constraints.
pub trait UnconstrainedProblem {
    fn num_vars(&self) -> usize;

    fn starting_point(&self) -> &[f64];

    fn eval_f(&self, x: &[f64]) -> ImpasseResult<f64>;

    fn eval_grad_f(&self, x: &[f64]) -> ImpasseResult<Vec<f64>>;

    fn eval_hessian_f(&self, x: &[f64]) -> ImpasseResult<CsrMatrix>;

    /// Parts of the contract this problem provides.
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.with(Capability::Unconstrained)
    }

    fn as_constrained(&self) -> Option<&dyn ConstrainedProblem> {
        None
    }

    fn as_ncp(&self) -> Option<&dyn NcpProblem> {
        None
    }

    fn as_barrier_general(&self) -> Option<&dyn BarrierGeneralProblem> {
        None
    }

    fn as_barrier(&self) -> Option<&dyn BarrierObjectiveProblem> {
        None
    }
}

/// Minimize `f(x)` subject to `g(x) ≥ 0`.
pub trait ConstrainedProblem: UnconstrainedProblem {
    fn num_constraints(&self) -> usize;

    fn eval_g(&self, x: &[f64]) -> ImpasseResult<Vec<f64>>;

    /// `m × n` jacobian of the constraints.
    fn eval_jac_g(&self, x: &[f64]) -> ImpasseResult<DenseMatrix>;

    /// One `n × n` hessian per constraint, or none.
    fn eval_hessian_g(&self, x: &[f64]) -> ImpasseResult<Vec<CsrMatrix>>;
}

/// Nonlinear complementarity form used by volume-style solvers.
pub trait NcpProblem: UnconstrainedProblem {
    fn eval_g(&self, x: &[f64]) -> ImpasseResult<Vec<f64>>;

    fn eval_g_with_jacobian(&self, x: &[f64]) -> ImpasseResult<NcpEvaluation>;

    fn is_dof_fixed(&self) -> &[bool];
}

/// Constrained problem solved with barriers on the constraints.
pub trait BarrierGeneralProblem: ConstrainedProblem {
    fn eval_f_and_fdiff(&self, x: &[f64], want_hessian: bool) -> ImpasseResult<Objective>;

    fn eval_g_and_gdiff(&self, x: &[f64]) -> ImpasseResult<ConstraintEvaluation>;

    fn barrier_epsilon(&self) -> f64;

    fn set_barrier_epsilon(&mut self, epsilon: f64);

    fn is_dof_fixed(&self) -> &[bool];

    /// True if moving from `x_i` to `x_j` causes a collision.
    fn has_collisions(&self, x_i: &[f64], x_j: &[f64]) -> ImpasseResult<bool>;

    fn debug_min_distance(&self, _x: &[f64]) -> ImpasseResult<f64> {
        Err(ImpasseError::Unimplemented("debug_min_distance"))
    }
}

/// Unconstrained objective with the barrier already folded in.
pub trait BarrierObjectiveProblem: UnconstrainedProblem {
    /// Value and gradient, plus the hessian when `want_hessian`.
    fn eval_f_and_fdiff(&self, x: &[f64], want_hessian: bool) -> ImpasseResult<Objective>;

    fn barrier_epsilon(&self) -> f64;

    fn is_dof_fixed(&self) -> &[bool];

    fn has_collisions(&self, x_i: &[f64], x_j: &[f64]) -> ImpasseResult<bool>;

    fn termination_threshold(&self) -> f64;

    /// Gradient of the energy alone.
    fn eval_grad_energy(&self, x: &[f64]) -> ImpasseResult<Vec<f64>>;

    /// Gradient of the barrier alone, with the number of active constraints.
    fn eval_grad_barrier(&self, x: &[f64]) -> ImpasseResult<(Vec<f64>, usize)>;

    fn debug_min_distance(&self, _x: &[f64]) -> ImpasseResult<f64> {
        Err(ImpasseError::Unimplemented("debug_min_distance"))
    }
}

// ─── Closure-backed problem ──────────────────────────────────

type ScalarFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;
type VectorFn = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;
type DenseFn = Box<dyn Fn(&[f64]) -> DenseMatrix + Send + Sync>;
type SparseFn = Box<dyn Fn(&[f64]) -> CsrMatrix + Send + Sync>;
type SparseListFn = Box<dyn Fn(&[f64]) -> Vec<CsrMatrix> + Send + Sync>;

/// Problem assembled from closures.
///
/// Without constraints it is a plain unconstrained problem. Bounds
/// default to [`NO_LOWER_BOUND`] / [`NO_UPPER_BOUND`] for `x` and to
/// `g(x) ≥ 0` for the constraints.
pub struct OptimizationProblem {
    num_vars: usize,
    num_constraints: usize,
    x0: Vec<f64>,
    x_lower: Vec<f64>,
    x_upper: Vec<f64>,
    g_lower: Vec<f64>,
    g_upper: Vec<f64>,
    f: ScalarFn,
    grad_f: VectorFn,
    hessian_f: Option<SparseFn>,
    g: Option<VectorFn>,
    jac_g: Option<DenseFn>,
    hessian_g: Option<SparseListFn>,
}

impl OptimizationProblem {
    /// Creates an unconstrained problem starting at `x0`.
    pub fn new(
        x0: Vec<f64>,
        f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static,
        grad_f: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    ) -> Self {
        let n = x0.len();
        Self {
            num_vars: n,
            num_constraints: 0,
            x0,
            x_lower: vec![NO_LOWER_BOUND; n],
            x_upper: vec![NO_UPPER_BOUND; n],
            g_lower: Vec::new(),
            g_upper: Vec::new(),
            f: Box::new(f),
            grad_f: Box::new(grad_f),
            hessian_f: None,
            g: None,
            jac_g: None,
            hessian_g: None,
        }
    }

    pub fn with_hessian_f(
        mut self,
        hessian_f: impl Fn(&[f64]) -> CsrMatrix + Send + Sync + 'static,
    ) -> Self {
        self.hessian_f = Some(Box::new(hessian_f));
        self
    }

    /// Adds `num_constraints` constraints `g(x) ≥ 0` with their jacobian.
    pub fn with_constraints(
        mut self,
        num_constraints: usize,
        g: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
        jac_g: impl Fn(&[f64]) -> DenseMatrix + Send + Sync + 'static,
    ) -> Self {
        self.num_constraints = num_constraints;
        self.g_lower = vec![0.0; num_constraints];
        self.g_upper = vec![NO_UPPER_BOUND; num_constraints];
        self.g = Some(Box::new(g));
        self.jac_g = Some(Box::new(jac_g));
        self
    }

    pub fn with_hessian_g(
        mut self,
        hessian_g: impl Fn(&[f64]) -> Vec<CsrMatrix> + Send + Sync + 'static,
    ) -> Self {
        self.hessian_g = Some(Box::new(hessian_g));
        self
    }

    /// Box bounds on `x`.
    pub fn with_bounds(mut self, x_lower: Vec<f64>, x_upper: Vec<f64>) -> ImpasseResult<Self> {
        check_len("x_lower", self.num_vars, x_lower.len())?;
        check_len("x_upper", self.num_vars, x_upper.len())?;
        self.x_lower = x_lower;
        self.x_upper = x_upper;
        Ok(self)
    }

    /// Bounds on `g(x)`.
    pub fn with_constraint_bounds(
        mut self,
        g_lower: Vec<f64>,
        g_upper: Vec<f64>,
    ) -> ImpasseResult<Self> {
        check_len("g_lower", self.num_constraints, g_lower.len())?;
        check_len("g_upper", self.num_constraints, g_upper.len())?;
        self.g_lower = g_lower;
        self.g_upper = g_upper;
        Ok(self)
    }

    pub fn x_lower(&self) -> &[f64] {
        &self.x_lower
    }

    pub fn x_upper(&self) -> &[f64] {
        &self.x_upper
    }

    pub fn g_lower(&self) -> &[f64] {
        &self.g_lower
    }

    pub fn g_upper(&self) -> &[f64] {
        &self.g_upper
    }

    fn check_x(&self, x: &[f64]) -> ImpasseResult<()> {
        check_len("x", self.num_vars, x.len())
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> ImpasseResult<()> {
    if expected != found {
        return Err(ImpasseError::DimensionMismatch { what, expected, found });
    }
    Ok(())
}

impl UnconstrainedProblem for OptimizationProblem {
    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn starting_point(&self) -> &[f64] {
        &self.x0
    }

    fn eval_f(&self, x: &[f64]) -> ImpasseResult<f64> {
        self.check_x(x)?;
        Ok((self.f)(x))
    }

    fn eval_grad_f(&self, x: &[f64]) -> ImpasseResult<Vec<f64>> {
        self.check_x(x)?;
        let grad = (self.grad_f)(x);
        check_len("grad_f", self.num_vars, grad.len())?;
        Ok(grad)
    }

    fn eval_hessian_f(&self, x: &[f64]) -> ImpasseResult<CsrMatrix> {
        self.check_x(x)?;
        let hessian_f = self
            .hessian_f
            .as_ref()
            .ok_or(ImpasseError::Unimplemented("eval_hessian_f"))?;
        let hess = hessian_f(x);
        check_len("hessian_f rows", self.num_vars, hess.rows)?;
        check_len("hessian_f cols", self.num_vars, hess.cols)?;
        Ok(hess)
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::NONE
            .with(Capability::Unconstrained)
            .with(Capability::Constrained);
        if self.hessian_f.is_some() {
            caps = caps.with(Capability::HessianF);
        }
        if self.hessian_g.is_some() {
            caps = caps.with(Capability::HessianG);
        }
        caps
    }

    fn as_constrained(&self) -> Option<&dyn ConstrainedProblem> {
        Some(self)
    }
}

impl ConstrainedProblem for OptimizationProblem {
    fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    fn eval_g(&self, x: &[f64]) -> ImpasseResult<Vec<f64>> {
        self.check_x(x)?;
        let Some(g) = &self.g else {
            return Ok(Vec::new());
        };
        let values = g(x);
        check_len("g", self.num_constraints, values.len())?;
        Ok(values)
    }

    fn eval_jac_g(&self, x: &[f64]) -> ImpasseResult<DenseMatrix> {
        self.check_x(x)?;
        let Some(jac_g) = &self.jac_g else {
            return Ok(DenseMatrix::zeros(0, self.num_vars));
        };
        let jac = jac_g(x);
        check_len("jac_g rows", self.num_constraints, jac.rows)?;
        check_len("jac_g cols", self.num_vars, jac.cols)?;
        Ok(jac)
    }

    fn eval_hessian_g(&self, x: &[f64]) -> ImpasseResult<Vec<CsrMatrix>> {
        self.check_x(x)?;
        let Some(hessian_g) = &self.hessian_g else {
            return Ok(Vec::new());
        };
        let hessians = hessian_g(x);
        check_len("hessian_g", self.num_constraints, hessians.len())?;
        Ok(hessians)
    }
}

// ─── Finite-difference checks ────────────────────────────────

/// Gradient of `eval_f` by central differences.
pub fn eval_grad_f_approx(
    problem: &dyn UnconstrainedProblem,
    x: &[f64],
) -> ImpasseResult<Vec<f64>> {
    problem.eval_f(x)?;
    Ok(finite_gradient(
        x,
        |xk| problem.eval_f(xk).unwrap_or(f64::NAN),
        DEFAULT_FINITE_DIFFERENCE_STEP,
    ))
}

/// Hessian as the central-difference jacobian of `eval_grad_f`.
pub fn eval_hess_f_approx(
    problem: &dyn UnconstrainedProblem,
    x: &[f64],
) -> ImpasseResult<DenseMatrix> {
    problem.eval_grad_f(x)?;
    Ok(finite_jacobian(
        x,
        |xk| {
            problem
                .eval_grad_f(xk)
                .unwrap_or_else(|_| vec![f64::NAN; xk.len()])
        },
        DEFAULT_FINITE_DIFFERENCE_STEP,
    ))
}
