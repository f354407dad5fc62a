//! The distance barrier constraint.
//!
//! Owns every collaborator a contact-aware solver needs: broad phase,
//! exact CCD, constraint builder, zero time-of-impact hook and the
//! constraint-set cache. It answers the queries the barrier solver asks
//! each iteration:
//!
//! ```text
//! constraint.initialize();
//! loop {
//!     constraint.compute_constraints(bodies, poses)?;       // barrier values
//!     constraint.compute_earliest_toi(bodies, t0, t1)?;     // step limit
//!     constraint.has_active_collisions(bodies, t0, t1)?;    // feasibility
//! }
//! ```

use std::sync::Arc;

use impasse_body::{Pose, RigidBodyAssembler};
use impasse_debug::ImpactHook;
use impasse_types::{ImpasseError, ImpasseResult};
use serde::Deserialize;

use crate::barrier::{barrier, barrier_gradient, barrier_hessian, BarrierType};
use crate::broad::BroadPhase;
use crate::candidates::{Candidates, CollisionKinds};
use crate::ccd::ExactCcd;
use crate::config::DistanceBarrierSettings;
use crate::constraint_cache::{ConstraintSetCache, ConstraintSetInputs};
use crate::constraint_set::{ConstraintBuilder, ConstraintSet, ProximityConstraintBuilder};
use crate::narrow_phase::{ImpactSummary, NarrowPhaseEvaluator};

/// Barrier-based non-penetration constraint over a set of rigid bodies.
pub struct DistanceBarrierConstraint {
    name: String,
    settings: DistanceBarrierSettings,
    /// Current d̂. Zero until [`initialize`](Self::initialize) is called.
    barrier_activation_distance: f64,
    broad_phase: Box<dyn BroadPhase>,
    ccd: Box<dyn ExactCcd>,
    builder: Box<dyn ConstraintBuilder>,
    hook: Option<Arc<dyn ImpactHook>>,
    cache: ConstraintSetCache,
}

impl DistanceBarrierConstraint {
    /// Creates a constraint with default settings around the given CCD.
    pub fn new(ccd: Box<dyn ExactCcd>) -> Self {
        let settings = DistanceBarrierSettings::default();
        Self {
            name: "distance_barrier_constraint".to_string(),
            broad_phase: settings.detection_method.broad_phase(),
            settings,
            barrier_activation_distance: 0.0,
            ccd,
            builder: Box::new(ProximityConstraintBuilder),
            hook: None,
            cache: ConstraintSetCache::new(),
        }
    }

    /// Replaces the settings and the broad phase they select.
    pub fn with_settings(mut self, settings: DistanceBarrierSettings) -> ImpasseResult<Self> {
        settings.validate()?;
        self.broad_phase = settings.detection_method.broad_phase();
        self.settings = settings;
        self.cache.clear();
        Ok(self)
    }

    pub fn with_broad_phase(mut self, broad_phase: Box<dyn BroadPhase>) -> Self {
        self.broad_phase = broad_phase;
        self.cache.clear();
        self
    }

    pub fn with_constraint_builder(mut self, builder: Box<dyn ConstraintBuilder>) -> Self {
        self.builder = builder;
        self.cache.clear();
        self
    }

    pub fn with_impact_hook(mut self, hook: Arc<dyn ImpactHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seeds d̂ from the settings and drops any cached constraint set.
    pub fn initialize(&mut self) {
        self.barrier_activation_distance = self.settings.initial_barrier_activation_distance;
        self.cache.clear();
        tracing::debug!(
            name = %self.name,
            dhat = self.barrier_activation_distance,
            barrier_type = %self.settings.barrier_type,
            broad_phase = self.broad_phase.name(),
            ccd = self.ccd.name(),
            "Initialized distance barrier constraint"
        );
    }

    // ─── Barrier parameters ──────────────────────────────────

    /// Current d̂.
    pub fn barrier_activation_distance(&self) -> f64 {
        self.barrier_activation_distance
    }

    pub fn set_barrier_activation_distance(&mut self, dhat: f64) {
        self.barrier_activation_distance = dhat;
    }

    pub fn minimum_separation_distance(&self) -> f64 {
        self.settings.minimum_separation_distance
    }

    pub fn barrier_type(&self) -> BarrierType {
        self.settings.barrier_type
    }

    // ─── Settings ────────────────────────────────────────────

    pub fn settings(&self) -> &DistanceBarrierSettings {
        &self.settings
    }

    /// Applies new settings. Takes effect for d̂ at the next
    /// [`initialize`](Self::initialize).
    pub fn apply_settings(&mut self, settings: DistanceBarrierSettings) -> ImpasseResult<()> {
        settings.validate()?;
        if settings.detection_method != self.settings.detection_method {
            self.broad_phase = settings.detection_method.broad_phase();
        }
        self.settings = settings;
        self.cache.clear();
        Ok(())
    }

    /// Settings as a JSON object.
    pub fn settings_json(&self) -> ImpasseResult<serde_json::Value> {
        serde_json::to_value(&self.settings).map_err(|e| ImpasseError::Serialization(e.to_string()))
    }

    /// Applies settings from a JSON object; missing keys take defaults.
    pub fn apply_settings_json(&mut self, json: &serde_json::Value) -> ImpasseResult<()> {
        let settings = DistanceBarrierSettings::deserialize(json)
            .map_err(|e| ImpasseError::Serialization(e.to_string()))?;
        self.apply_settings(settings)
    }

    // ─── Collision queries ───────────────────────────────────

    fn step_candidates(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
    ) -> ImpasseResult<Candidates> {
        self.broad_phase.detect_candidates(
            bodies,
            poses_t0,
            poses_t1,
            CollisionKinds::for_dim(bodies.dim()),
            self.settings.minimum_separation_distance / 2.0,
        )
    }

    fn narrow_phase<'a>(
        &'a self,
        bodies: &'a RigidBodyAssembler,
        poses_t0: &'a [Pose],
        poses_t1: &'a [Pose],
    ) -> NarrowPhaseEvaluator<'a> {
        NarrowPhaseEvaluator::new(self.ccd.as_ref(), bodies, poses_t0, poses_t1)
            .with_trajectory(self.settings.trajectory_type)
            .with_minimum_separation(self.settings.minimum_separation_distance)
            .with_hook(self.hook.as_deref())
    }

    /// Returns true if any primitive pair collides moving from
    /// `poses_t0` to `poses_t1`.
    pub fn has_active_collisions(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
    ) -> ImpasseResult<bool> {
        let _span = tracing::debug_span!("has_active_collisions").entered();
        let candidates = self.step_candidates(bodies, poses_t0, poses_t1)?;
        Ok(self
            .narrow_phase(bodies, poses_t0, poses_t1)
            .has_active_collisions(&candidates))
    }

    /// Earliest time of impact in `[0, 1]`, or `+∞` if nothing collides.
    pub fn compute_earliest_toi(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
    ) -> ImpasseResult<f64> {
        Ok(self.impact_summary(bodies, poses_t0, poses_t1)?.earliest_toi)
    }

    /// Earliest time of impact together with collision statistics.
    pub fn impact_summary(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
    ) -> ImpasseResult<ImpactSummary> {
        let candidates = self.step_candidates(bodies, poses_t0, poses_t1)?;
        Ok(self
            .narrow_phase(bodies, poses_t0, poses_t1)
            .impact_summary(&candidates))
    }

    // ─── Proximity queries ───────────────────────────────────

    /// Active constraints at `poses`, served from the cache when the
    /// configuration is unchanged.
    pub fn construct_constraint_set(
        &self,
        bodies: &RigidBodyAssembler,
        poses: &[Pose],
    ) -> ImpasseResult<Arc<ConstraintSet>> {
        self.cache.construct_constraint_set(ConstraintSetInputs {
            bodies,
            poses,
            dhat: self.barrier_activation_distance,
            dmin: self.settings.minimum_separation_distance,
            broad_phase: self.broad_phase.as_ref(),
            builder: self.builder.as_ref(),
        })
    }

    /// Smallest distance over the active constraints, `+∞` if none.
    pub fn compute_minimum_distance(
        &self,
        bodies: &RigidBodyAssembler,
        poses: &[Pose],
    ) -> ImpasseResult<f64> {
        let constraint_set = self.construct_constraint_set(bodies, poses)?;
        let world = bodies.world_vertices(poses)?;
        let d2 = self
            .builder
            .min_distance_squared(&world, bodies.edges(), bodies.faces(), &constraint_set);
        Ok(d2.sqrt())
    }

    /// Distances of every active constraint, in constraint-set order.
    pub fn compute_distances(
        &self,
        bodies: &RigidBodyAssembler,
        poses: &[Pose],
    ) -> ImpasseResult<Vec<f64>> {
        let constraint_set = self.construct_constraint_set(bodies, poses)?;
        let world = bodies.world_vertices(poses)?;
        Ok(constraint_set
            .iter()
            .map(|c| c.distance_squared(&world, bodies.edges(), bodies.faces()).sqrt())
            .collect())
    }

    /// Barrier value of every active constraint.
    pub fn compute_constraints(
        &self,
        bodies: &RigidBodyAssembler,
        poses: &[Pose],
    ) -> ImpasseResult<Vec<f64>> {
        Ok(self
            .compute_distances(bodies, poses)?
            .into_iter()
            .map(|d| self.barrier_at(d))
            .collect())
    }

    /// Drops the cached constraint set.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // ─── Barrier of a distance ───────────────────────────────

    /// `b(d - d_min; dhat)`.
    pub fn distance_barrier(&self, distance: f64, dhat: f64) -> f64 {
        barrier(self.separation(distance), dhat, self.settings.barrier_type)
    }

    pub fn distance_barrier_gradient(&self, distance: f64, dhat: f64) -> f64 {
        barrier_gradient(self.separation(distance), dhat, self.settings.barrier_type)
    }

    pub fn distance_barrier_hessian(&self, distance: f64, dhat: f64) -> f64 {
        barrier_hessian(self.separation(distance), dhat, self.settings.barrier_type)
    }

    /// `d - d_min`.
    fn separation(&self, distance: f64) -> f64 {
        distance - self.settings.minimum_separation_distance
    }

    /// [`distance_barrier`](Self::distance_barrier) at the current d̂.
    pub fn barrier_at(&self, distance: f64) -> f64 {
        self.distance_barrier(distance, self.barrier_activation_distance)
    }

    pub fn barrier_gradient_at(&self, distance: f64) -> f64 {
        self.distance_barrier_gradient(distance, self.barrier_activation_distance)
    }

    pub fn barrier_hessian_at(&self, distance: f64) -> f64 {
        self.distance_barrier_hessian(distance, self.barrier_activation_distance)
    }
}
