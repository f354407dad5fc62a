//! # impasse-contact
//!
//! Collision candidates, barrier potentials and contact constraints
//! for rigid bodies.
//!
//! The pipeline is split into phases:
//! 1. **Broad phase**: inflated swept boxes to candidate pairs
//! 2. **Narrow phase**: exact CCD for the earliest time of impact
//! 3. **Constraint set**: candidates within the barrier activation range
//! 4. **Barrier**: smooth potentials on the constraint distances
//!
//! Broad phase, CCD and constraint building are traits, so the
//! [`DistanceBarrierConstraint`] can be assembled from any strategy.

pub mod barrier;
pub mod broad;
pub mod candidates;
pub mod ccd;
pub mod config;
pub mod constraint_cache;
pub mod constraint_set;
pub mod distance;
pub mod distance_barrier;
pub mod hash_grid;
pub mod narrow_phase;

pub use barrier::{barrier, barrier_gradient, barrier_hessian, BarrierType};
pub use broad::{BroadPhase, BruteForceBroadPhase};
pub use candidates::{
    Candidate, Candidates, CollisionKinds, EdgeEdgeCandidate, EdgeVertexCandidate,
    FaceVertexCandidate,
};
pub use ccd::{CcdQuery, ExactCcd, TrajectoryType};
pub use config::{DetectionMethod, DistanceBarrierSettings};
pub use constraint_cache::{ConstraintSetCache, ConstraintSetInputs};
pub use constraint_set::{
    ConstraintBuilder, ConstraintSet, ContactConstraint, ProximityConstraintBuilder,
};
pub use distance_barrier::DistanceBarrierConstraint;
pub use hash_grid::HashGrid;
pub use narrow_phase::{ImpactSummary, NarrowPhaseEvaluator};
