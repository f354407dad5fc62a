//! # impasse-solver
//!
//! Optimization problem contract and the barrier-weighted objective
//! consumed by Newton-type solvers.
//!
//! ## Key Types
//!
//! - [`UnconstrainedProblem`] and the capability traits built on it
//! - [`OptimizationProblem`]: closure-backed problem with shape checks
//! - [`ObjectiveTerm`]: one additive piece of an objective
//! - [`DistanceBarrierTerm`]: contact barrier over rigid-body dofs
//! - [`BarrierProblem`]: `E(x) + κ B(x)`
//! - [`newton_direction`]: pinned, regularized Newton step

pub mod barrier_problem;
pub mod barrier_term;
pub mod config;
pub mod newton;
pub mod problem;
pub mod term;

pub use barrier_problem::{eval_grad_energy_approx, eval_hess_energy_approx, BarrierProblem};
pub use barrier_term::DistanceBarrierTerm;
pub use config::BarrierProblemConfig;
pub use newton::{newton_direction, NewtonDirection};
pub use problem::{
    eval_grad_f_approx, eval_hess_f_approx, BarrierGeneralProblem, BarrierObjectiveProblem,
    Capabilities, Capability, ConstrainedProblem, ConstraintEvaluation, NcpEvaluation, NcpProblem,
    Objective, OptimizationProblem, UnconstrainedProblem,
};
pub use term::{InertialEnergy, ObjectiveTerm, TermEvaluation};
