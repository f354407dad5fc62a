//! Barrier problem configuration.
//!
//! Parameters that weight the barrier against the energy and control
//! the derivative checks.

use impasse_types::constants::{
    DEFAULT_BARRIER_STIFFNESS, DEFAULT_FINITE_DIFFERENCE_STEP, DEFAULT_TERMINATION_THRESHOLD,
};
use impasse_types::{ImpasseError, ImpasseResult};
use serde::{Deserialize, Serialize};

/// Configuration for a [`BarrierProblem`](crate::BarrierProblem).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierProblemConfig {
    /// Barrier stiffness κ in `E(x) + κ B(x)`.
    pub barrier_stiffness: f64,

    /// Gradient norm below which a Newton loop stops.
    pub termination_threshold: f64,

    /// Step for central finite differences (constraint distance
    /// gradients and derivative checks).
    pub finite_difference_step: f64,
}

impl Default for BarrierProblemConfig {
    fn default() -> Self {
        Self {
            barrier_stiffness: DEFAULT_BARRIER_STIFFNESS,
            termination_threshold: DEFAULT_TERMINATION_THRESHOLD,
            finite_difference_step: DEFAULT_FINITE_DIFFERENCE_STEP,
        }
    }
}

impl BarrierProblemConfig {
    /// Creates a config for debugging (looser termination).
    pub fn debug() -> Self {
        Self {
            termination_threshold: 1e-3,
            ..Default::default()
        }
    }

    /// Creates a high-quality config (stiffer barrier, tighter termination).
    pub fn high_quality() -> Self {
        Self {
            barrier_stiffness: 1e2,
            termination_threshold: 1e-9,
            ..Default::default()
        }
    }

    /// Checks that every parameter is positive and finite.
    pub fn validate(&self) -> ImpasseResult<()> {
        for (name, value) in [
            ("barrier_stiffness", self.barrier_stiffness),
            ("termination_threshold", self.termination_threshold),
            ("finite_difference_step", self.finite_difference_step),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ImpasseError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}
