//! Narrow phase: exact CCD over a candidate set.
//!
//! Two queries are offered:
//! - [`NarrowPhaseEvaluator::has_active_collisions`] stops at the first
//!   colliding candidate and runs sequentially.
//! - [`NarrowPhaseEvaluator::earliest_time_of_impact`] evaluates every
//!   candidate in parallel and reduces to the smallest time of impact.
//!
//! In the parallel query, the smallest time of impact found so far is
//! shared through an atomic and passed to the CCD as a hint. The result
//! itself is a reduction of per-worker minima, so it does not depend on
//! scheduling.

use std::sync::atomic::{AtomicU64, Ordering};

use impasse_body::{Pose, RigidBodyAssembler};
use impasse_debug::{ImpactHook, ImpactSnapshot};
use rayon::prelude::*;

use crate::candidates::{Candidate, Candidates};
use crate::ccd::{CcdQuery, ExactCcd, TrajectoryType};

/// Outcome of a full narrow-phase pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactSummary {
    /// Smallest time of impact, `+∞` when nothing collides.
    pub earliest_toi: f64,
    pub num_candidates: usize,
    pub num_collisions: usize,
}

impl ImpactSummary {
    /// Percentage of candidates that collide (100 for an empty set).
    pub fn collision_percentage(&self) -> f64 {
        if self.num_candidates == 0 {
            100.0
        } else {
            self.num_collisions as f64 / self.num_candidates as f64 * 100.0
        }
    }
}

/// Runs CCD queries for one step `poses_t0 → poses_t1`.
pub struct NarrowPhaseEvaluator<'a> {
    ccd: &'a dyn ExactCcd,
    hook: Option<&'a dyn ImpactHook>,
    bodies: &'a RigidBodyAssembler,
    poses_t0: &'a [Pose],
    poses_t1: &'a [Pose],
    trajectory: TrajectoryType,
    minimum_separation: f64,
}

impl<'a> NarrowPhaseEvaluator<'a> {
    pub fn new(
        ccd: &'a dyn ExactCcd,
        bodies: &'a RigidBodyAssembler,
        poses_t0: &'a [Pose],
        poses_t1: &'a [Pose],
    ) -> Self {
        Self {
            ccd,
            hook: None,
            bodies,
            poses_t0,
            poses_t1,
            trajectory: TrajectoryType::default(),
            minimum_separation: 0.0,
        }
    }

    pub fn with_trajectory(mut self, trajectory: TrajectoryType) -> Self {
        self.trajectory = trajectory;
        self
    }

    pub fn with_minimum_separation(mut self, minimum_separation: f64) -> Self {
        self.minimum_separation = minimum_separation;
        self
    }

    /// Receiver for zero time-of-impact snapshots.
    pub fn with_hook(mut self, hook: Option<&'a dyn ImpactHook>) -> Self {
        self.hook = hook;
        self
    }

    fn query(
        &self,
        trajectory: TrajectoryType,
        earliest_toi: f64,
        minimum_separation: f64,
    ) -> CcdQuery<'a> {
        CcdQuery {
            bodies: self.bodies,
            poses_t0: self.poses_t0,
            poses_t1: self.poses_t1,
            trajectory,
            earliest_toi,
            minimum_separation,
        }
    }

    /// Returns true if any candidate collides during the step.
    ///
    /// Kinds are tried in the order edge-vertex, edge-edge, face-vertex.
    /// Collisions are tested with zero separation and no hint.
    pub fn has_active_collisions(&self, candidates: &Candidates) -> bool {
        let query = self.query(self.trajectory.for_existence_query(), 1.0, 0.0);
        candidates
            .iter()
            .any(|candidate| self.ccd.ccd(&query, &candidate).is_some())
    }

    /// Smallest time of impact over all candidates, `+∞` if none collide.
    pub fn earliest_time_of_impact(&self, candidates: &Candidates) -> f64 {
        self.impact_summary(candidates).earliest_toi
    }

    /// Full narrow-phase pass with collision statistics.
    pub fn impact_summary(&self, candidates: &Candidates) -> ImpactSummary {
        let _span = tracing::debug_span!("earliest_time_of_impact").entered();

        let num_candidates = candidates.len();
        let hint = AtomicU64::new(1.0_f64.to_bits());

        let (earliest_toi, num_collisions) = (0..num_candidates)
            .into_par_iter()
            .filter_map(|i| candidates.get(i))
            .fold(
                || (f64::INFINITY, 0usize),
                |(best, count), candidate| {
                    let query = self.query(
                        self.trajectory,
                        f64::from_bits(hint.load(Ordering::Relaxed)),
                        self.minimum_separation,
                    );
                    match self.ccd.ccd(&query, &candidate) {
                        Some(toi) => {
                            if toi == 0.0 {
                                self.report_zero_toi(&candidate);
                            }
                            lower_hint(&hint, toi);
                            (best.min(toi), count + 1)
                        }
                        None => (best, count),
                    }
                },
            )
            .reduce(
                || (f64::INFINITY, 0usize),
                |(a, na), (b, nb)| (a.min(b), na + nb),
            );

        let summary = ImpactSummary {
            earliest_toi,
            num_candidates,
            num_collisions,
        };
        tracing::debug!(
            num_candidates,
            num_collisions,
            percentage = summary.collision_percentage(),
            "Narrow phase complete"
        );
        summary
    }

    fn report_zero_toi(&self, candidate: &Candidate) {
        tracing::error!("{} CCD resulted in toi=0!", candidate.kind().label());
        let Some(hook) = self.hook else {
            return;
        };
        let (bodies, t0, t1) = (self.bodies, self.poses_t0, self.poses_t1);
        let snapshot = match candidate {
            Candidate::EdgeVertex(c) => {
                ImpactSnapshot::edge_vertex(bodies, t0, t1, c.edge, c.vertex)
            }
            Candidate::EdgeEdge(c) => ImpactSnapshot::edge_edge(bodies, t0, t1, c.edge0, c.edge1),
            Candidate::FaceVertex(c) => {
                ImpactSnapshot::face_vertex(bodies, t0, t1, c.face, c.vertex)
            }
        };
        hook.on_zero_toi(&snapshot);
    }
}

/// Lowers the shared hint to `toi` if that is a strict improvement.
fn lower_hint(hint: &AtomicU64, toi: f64) {
    let mut current = hint.load(Ordering::Relaxed);
    while toi < f64::from_bits(current) {
        let lowered = toi.to_bits();
        match hint.compare_exchange_weak(current, lowered, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}
