//! Single-entry cache of the last constructed constraint set.
//!
//! Newton iterations evaluate the objective, gradient and hessian at the
//! same configuration, so the constraint set is rebuilt only when the
//! poses (or the barrier parameters) change.

use std::sync::{Arc, Mutex, MutexGuard};

use impasse_body::{Pose, RigidBodyAssembler};
use impasse_types::ImpasseResult;

use crate::broad::BroadPhase;
use crate::candidates::CollisionKinds;
use crate::constraint_set::{ConstraintBuilder, ConstraintSet};

struct CacheEntry {
    poses: Vec<Pose>,
    dhat: f64,
    dmin: f64,
    constraint_set: Arc<ConstraintSet>,
}

impl CacheEntry {
    fn matches(&self, poses: &[Pose], dhat: f64, dmin: f64) -> bool {
        self.poses == poses && self.dhat == dhat && self.dmin == dmin
    }
}

/// Everything needed to build a constraint set for one configuration.
#[derive(Clone, Copy)]
pub struct ConstraintSetInputs<'a> {
    pub bodies: &'a RigidBodyAssembler,
    pub poses: &'a [Pose],
    pub dhat: f64,
    pub dmin: f64,
    pub broad_phase: &'a dyn BroadPhase,
    pub builder: &'a dyn ConstraintBuilder,
}

/// Last-write-wins cache of one constraint set.
#[derive(Default)]
pub struct ConstraintSetCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl ConstraintSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the constraint set for `inputs.poses`.
    ///
    /// Scenes with fewer than two bodies have no contacts and get an
    /// empty set, which is not cached.
    pub fn construct_constraint_set(
        &self,
        inputs: ConstraintSetInputs<'_>,
    ) -> ImpasseResult<Arc<ConstraintSet>> {
        let ConstraintSetInputs {
            bodies,
            poses,
            dhat,
            dmin,
            broad_phase,
            builder,
        } = inputs;

        if bodies.num_bodies() <= 1 {
            return Ok(Arc::new(ConstraintSet::new()));
        }

        if let Some(entry) = self.lock().as_ref() {
            if entry.matches(poses, dhat, dmin) {
                tracing::trace!(
                    constraints = entry.constraint_set.len(),
                    "Constraint set cache hit"
                );
                return Ok(Arc::clone(&entry.constraint_set));
            }
        }

        let _span = tracing::debug_span!("construct_constraint_set").entered();
        tracing::trace!("Constraint set cache miss");

        let inflation_radius = dhat + dmin / 2.0;
        let candidates = broad_phase.detect_candidates_at(
            bodies,
            poses,
            CollisionKinds::for_dim(bodies.dim()),
            inflation_radius,
        )?;

        let world = bodies.world_vertices(poses)?;
        let constraint_set = Arc::new(builder.build_constraint_set(
            &candidates,
            &world,
            &world,
            bodies.edges(),
            bodies.faces(),
            dhat,
            dmin,
        ));
        tracing::debug!(
            candidates = candidates.len(),
            constraints = constraint_set.len(),
            "Built constraint set"
        );

        *self.lock() = Some(CacheEntry {
            poses: poses.to_vec(),
            dhat,
            dmin,
            constraint_set: Arc::clone(&constraint_set),
        });
        Ok(constraint_set)
    }

    /// Drops the cached entry.
    pub fn clear(&self) {
        *self.lock() = None;
    }
}
