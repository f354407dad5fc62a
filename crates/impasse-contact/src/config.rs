//! Distance barrier configuration.
//!
//! Field names match the keys of the `distance_barrier_constraint`
//! section of a settings file.

use impasse_types::constants::{DEFAULT_BARRIER_ACTIVATION_DISTANCE, DEFAULT_MINIMUM_SEPARATION};
use impasse_types::{ImpasseError, ImpasseResult};
use serde::{Deserialize, Serialize};

use crate::barrier::BarrierType;
use crate::broad::{BroadPhase, BruteForceBroadPhase};
use crate::ccd::TrajectoryType;
use crate::hash_grid::HashGrid;

/// Broad phase used when none is injected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    BruteForce,
    #[default]
    HashGrid,
}

impl DetectionMethod {
    pub fn broad_phase(self) -> Box<dyn BroadPhase> {
        match self {
            Self::BruteForce => Box::new(BruteForceBroadPhase),
            Self::HashGrid => Box::new(HashGrid::new()),
        }
    }
}

/// Configuration for the distance barrier constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceBarrierSettings {
    /// d̂ used when the constraint is initialized.
    pub initial_barrier_activation_distance: f64,

    /// d_min: separation treated as contact. Barriers act on `d - d_min`.
    pub minimum_separation_distance: f64,

    /// Barrier family.
    pub barrier_type: BarrierType,

    /// Motion model for CCD queries.
    pub trajectory_type: TrajectoryType,

    /// Broad phase strategy.
    pub detection_method: DetectionMethod,
}

impl Default for DistanceBarrierSettings {
    fn default() -> Self {
        Self {
            initial_barrier_activation_distance: DEFAULT_BARRIER_ACTIVATION_DISTANCE,
            minimum_separation_distance: DEFAULT_MINIMUM_SEPARATION,
            barrier_type: BarrierType::Ipc,
            trajectory_type: TrajectoryType::Rigid,
            detection_method: DetectionMethod::HashGrid,
        }
    }
}

impl DistanceBarrierSettings {
    /// Planar scenes: linear trajectories and a brute-force broad phase.
    pub fn planar() -> Self {
        Self {
            trajectory_type: TrajectoryType::Linear,
            detection_method: DetectionMethod::BruteForce,
            ..Default::default()
        }
    }

    /// Thin-gap scenes: a tighter d̂ and the smoother spline barrier.
    pub fn thin_gap() -> Self {
        Self {
            initial_barrier_activation_distance: 1e-4,
            barrier_type: BarrierType::Spline,
            ..Default::default()
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ImpasseResult<()> {
        let dhat = self.initial_barrier_activation_distance;
        if !(dhat > 0.0 && dhat.is_finite()) {
            return Err(ImpasseError::InvalidConfig(format!(
                "initial_barrier_activation_distance must be positive and finite, got {dhat}"
            )));
        }
        let dmin = self.minimum_separation_distance;
        if !(dmin >= 0.0 && dmin.is_finite()) {
            return Err(ImpasseError::InvalidConfig(format!(
                "minimum_separation_distance must be non-negative and finite, got {dmin}"
            )));
        }
        Ok(())
    }
}
