//! Integration tests for impasse-contact.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use impasse_body::generators::{cuboid, square};
use impasse_body::{Pose, RigidBodyAssembler};
use impasse_contact::distance::{
    edge_edge_distance_squared, point_edge_distance_squared, point_triangle_distance_squared,
};
use impasse_contact::{
    barrier, barrier_gradient, barrier_hessian, BarrierType, BroadPhase, BruteForceBroadPhase,
    Candidate, Candidates, CcdQuery, CollisionKinds, ConstraintBuilder, ConstraintSet,
    DetectionMethod, DistanceBarrierConstraint, DistanceBarrierSettings, EdgeEdgeCandidate,
    EdgeVertexCandidate, ExactCcd, FaceVertexCandidate, HashGrid, NarrowPhaseEvaluator,
    ProximityConstraintBuilder, TrajectoryType,
};
use impasse_debug::{CollectingHook, ImpactHook};
use impasse_math::DVec3;
use impasse_types::{CandidateKind, ImpasseError};

// ─── Stubs ────────────────────────────────────────────────────

/// Record of every query a scripted CCD received.
#[derive(Default)]
struct CcdLog {
    calls: AtomicUsize,
    hints: Mutex<Vec<f64>>,
    trajectories: Mutex<Vec<TrajectoryType>>,
    separations: Mutex<Vec<f64>>,
}

/// CCD answering from a table, with a fallback for unlisted candidates.
struct ScriptedCcd {
    tois: HashMap<Candidate, f64>,
    fallback: Option<f64>,
    log: Arc<CcdLog>,
}

impl ScriptedCcd {
    fn new(tois: impl IntoIterator<Item = (Candidate, f64)>) -> Self {
        Self {
            tois: tois.into_iter().collect(),
            fallback: None,
            log: Arc::new(CcdLog::default()),
        }
    }

    fn always(toi: Option<f64>) -> Self {
        Self {
            fallback: toi,
            ..Self::new([])
        }
    }

    fn answer(&self, query: &CcdQuery<'_>, candidate: Candidate) -> Option<f64> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        self.log.hints.lock().unwrap().push(query.earliest_toi);
        self.log.trajectories.lock().unwrap().push(query.trajectory);
        self.log.separations.lock().unwrap().push(query.minimum_separation);
        self.tois.get(&candidate).copied().or(self.fallback)
    }
}

impl ExactCcd for ScriptedCcd {
    fn edge_vertex_ccd(&self, query: &CcdQuery<'_>, c: &EdgeVertexCandidate) -> Option<f64> {
        self.answer(query, Candidate::EdgeVertex(*c))
    }

    fn edge_edge_ccd(&self, query: &CcdQuery<'_>, c: &EdgeEdgeCandidate) -> Option<f64> {
        self.answer(query, Candidate::EdgeEdge(*c))
    }

    fn face_vertex_ccd(&self, query: &CcdQuery<'_>, c: &FaceVertexCandidate) -> Option<f64> {
        self.answer(query, Candidate::FaceVertex(*c))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Proximity builder that counts how often it is asked to build.
struct CountingBuilder {
    builds: Arc<AtomicUsize>,
}

impl ConstraintBuilder for CountingBuilder {
    fn build_constraint_set(
        &self,
        candidates: &Candidates,
        rest_positions: &[DVec3],
        world_positions: &[DVec3],
        edges: &[[u32; 2]],
        faces: &[[u32; 3]],
        dhat: f64,
        dmin: f64,
    ) -> ConstraintSet {
        self.builds.fetch_add(1, Ordering::SeqCst);
        ProximityConstraintBuilder.build_constraint_set(
            candidates,
            rest_positions,
            world_positions,
            edges,
            faces,
            dhat,
            dmin,
        )
    }

    fn name(&self) -> &str {
        "counting"
    }
}

// ─── Scenes ───────────────────────────────────────────────────

/// Two unit squares side by side, separated by `gap` along X.
fn two_squares(gap: f64) -> RigidBodyAssembler {
    let a = square(0.5, Pose::planar(0.0, 0.0, 0.0)).unwrap();
    let b = square(0.5, Pose::planar(1.0 + gap, 0.0, 0.0)).unwrap();
    RigidBodyAssembler::new(vec![a, b]).unwrap()
}

fn two_cubes(gap: f64) -> RigidBodyAssembler {
    let a = cuboid(DVec3::splat(0.5), Pose::identity()).unwrap();
    let b = cuboid(
        DVec3::splat(0.5),
        Pose::new(DVec3::new(0.2, 0.1, 1.0 + gap), DVec3::new(0.0, 0.0, 0.3)),
    )
    .unwrap();
    RigidBodyAssembler::new(vec![a, b]).unwrap()
}

fn ev(edge: u32, vertex: u32) -> Candidate {
    Candidate::EdgeVertex(EdgeVertexCandidate::new(edge, vertex))
}

// ─── Barrier Tests ────────────────────────────────────────────

#[test]
fn barrier_vanishes_beyond_activation_distance() {
    for ty in BarrierType::ALL {
        for x in [1.0, 1.5, 10.0] {
            assert_eq!(barrier(x, 1.0, ty), 0.0, "{ty} value at {x}");
            assert_eq!(barrier_gradient(x, 1.0, ty), 0.0, "{ty} gradient at {x}");
            assert_eq!(barrier_hessian(x, 1.0, ty), 0.0, "{ty} hessian at {x}");
        }
    }
}

#[test]
fn barrier_non_positive_distance() {
    for ty in BarrierType::ALL {
        for x in [0.0, -1e-3] {
            assert_eq!(barrier(x, 1.0, ty), f64::INFINITY);
            assert_eq!(barrier_gradient(x, 1.0, ty), 0.0);
            assert_eq!(barrier_hessian(x, 1.0, ty), 0.0);
        }
    }
}

#[test]
fn barrier_diverges_toward_contact() {
    for ty in BarrierType::ALL {
        let far = barrier(1e-3, 1.0, ty);
        let near = barrier(1e-6, 1.0, ty);
        let touching = barrier(1e-9, 1.0, ty);
        assert!(touching > near && near > far, "{ty}: {touching} {near} {far}");
    }
}

#[test]
fn barrier_shape_inside_range() {
    for ty in BarrierType::ALL {
        for x in [0.05, 0.25, 0.5, 0.75, 0.95] {
            assert!(barrier(x, 1.0, ty) > 0.0);
            assert!(barrier(x, 1.0, ty).is_finite());
            assert!(barrier_gradient(x, 1.0, ty) < 0.0);
            assert!(barrier_hessian(x, 1.0, ty) >= 0.0);
        }
    }
}

#[test]
fn barrier_gradient_matches_finite_differences() {
    let h = 1e-6;
    for ty in BarrierType::ALL {
        for x in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let fd = (barrier(x + h, 1.0, ty) - barrier(x - h, 1.0, ty)) / (2.0 * h);
            assert_relative_eq!(
                barrier_gradient(x, 1.0, ty),
                fd,
                epsilon = 1e-5,
                max_relative = 1e-6
            );
        }
    }
}

#[test]
fn barrier_hessian_matches_finite_differences() {
    let h = 1e-6;
    for ty in BarrierType::ALL {
        for x in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let fd =
                (barrier_gradient(x + h, 1.0, ty) - barrier_gradient(x - h, 1.0, ty)) / (2.0 * h);
            assert_relative_eq!(
                barrier_hessian(x, 1.0, ty),
                fd,
                epsilon = 1e-5,
                max_relative = 1e-6
            );
        }
    }
}

#[test]
fn barrier_scales_with_activation_distance() {
    // IPC: b(x; s) = -(x - s)² ln(x / s)
    let (x, s) = (0.002, 0.01);
    assert_relative_eq!(
        barrier(x, s, BarrierType::Ipc),
        -(x - s) * (x - s) * (x / s).ln(),
        max_relative = 1e-14
    );
}

#[test]
fn spline_barrier_is_reciprocal_cubic() {
    for t in [0.1, 0.4, 0.8] {
        let g = t * t * t - 3.0 * t * t + 3.0 * t;
        assert_relative_eq!(
            barrier(t, 1.0, BarrierType::Spline),
            1.0 / g - 1.0,
            max_relative = 1e-12
        );
    }
    // Continuous at the activation distance.
    assert!(barrier(1.0 - 1e-9, 1.0, BarrierType::Spline) < 1e-20);
}

#[test]
fn barrier_type_names() {
    assert_eq!("poly_log".parse::<BarrierType>().unwrap(), BarrierType::PolyLog);
    assert!("log".parse::<BarrierType>().is_err());
    assert_eq!(serde_json::to_string(&BarrierType::Spline).unwrap(), "\"spline\"");
    assert_eq!(BarrierType::default(), BarrierType::Ipc);
}

// ─── Candidate Tests ──────────────────────────────────────────

#[test]
fn candidates_flat_index_order() {
    let candidates = Candidates {
        ev: vec![EdgeVertexCandidate::new(0, 4)],
        ee: vec![EdgeEdgeCandidate::new(1, 5), EdgeEdgeCandidate::new(2, 6)],
        fv: vec![FaceVertexCandidate::new(3, 7)],
    };
    assert_eq!(candidates.len(), 4);
    assert_eq!(candidates.get(0).unwrap().kind(), CandidateKind::EdgeVertex);
    assert_eq!(candidates.get(2), Some(Candidate::EdgeEdge(EdgeEdgeCandidate::new(2, 6))));
    assert_eq!(candidates.get(3).unwrap().kind(), CandidateKind::FaceVertex);
    assert_eq!(candidates.get(4), None);

    let flat: Vec<_> = candidates.iter().collect();
    assert_eq!(flat.len(), 4);
    assert_eq!(flat.into_iter().collect::<Candidates>(), candidates);
}

#[test]
fn collision_kinds_by_dimension() {
    let planar = CollisionKinds::for_dim(2);
    assert!(planar.contains(CandidateKind::EdgeVertex));
    assert!(!planar.contains(CandidateKind::EdgeEdge));
    assert!(!planar.contains(CandidateKind::FaceVertex));

    let volumetric = CollisionKinds::for_dim(3);
    assert!(!volumetric.contains(CandidateKind::EdgeVertex));
    assert!(volumetric.contains(CandidateKind::EdgeEdge));
    assert!(volumetric.contains(CandidateKind::FaceVertex));
}

#[test]
fn trajectory_for_existence_query() {
    assert_eq!(TrajectoryType::PiecewiseLinear.for_existence_query(), TrajectoryType::Rigid);
    assert_eq!(TrajectoryType::Linear.for_existence_query(), TrajectoryType::Linear);
    assert_eq!(TrajectoryType::Rigid.for_existence_query(), TrajectoryType::Rigid);
}

// ─── Distance Tests ───────────────────────────────────────────

#[test]
fn point_edge_distance_regions() {
    let (a, b) = (DVec3::ZERO, DVec3::X);
    assert_relative_eq!(point_edge_distance_squared(DVec3::new(0.5, 2.0, 0.0), a, b), 4.0);
    assert_relative_eq!(point_edge_distance_squared(DVec3::new(-1.0, 0.0, 0.0), a, b), 1.0);
    assert_relative_eq!(point_edge_distance_squared(DVec3::new(2.0, 1.0, 0.0), a, b), 2.0);
    // Degenerate edge falls back to the point distance.
    assert_relative_eq!(point_edge_distance_squared(DVec3::Y, a, a), 1.0);
}

#[test]
fn edge_edge_distance_cases() {
    // Skew edges crossing at a distance of 1 along Z.
    let d = edge_edge_distance_squared(
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 1.0),
        DVec3::new(0.0, 1.0, 1.0),
    );
    assert_relative_eq!(d, 1.0, epsilon = 1e-14);

    // Parallel, overlapping edges.
    let d = edge_edge_distance_squared(
        DVec3::ZERO,
        DVec3::X,
        DVec3::new(0.5, 0.5, 0.0),
        DVec3::new(1.5, 0.5, 0.0),
    );
    assert_relative_eq!(d, 0.25, epsilon = 1e-14);

    // Collinear, disjoint edges.
    let d = edge_edge_distance_squared(
        DVec3::ZERO,
        DVec3::X,
        DVec3::new(3.0, 0.0, 0.0),
        DVec3::new(4.0, 0.0, 0.0),
    );
    assert_relative_eq!(d, 4.0, epsilon = 1e-14);
}

#[test]
fn point_triangle_distance_regions() {
    let (a, b, c) = (DVec3::ZERO, DVec3::X, DVec3::Y);
    // Above the interior.
    assert_relative_eq!(point_triangle_distance_squared(DVec3::new(0.2, 0.2, 0.5), a, b, c), 0.25);
    // Beyond vertex b.
    assert_relative_eq!(point_triangle_distance_squared(DVec3::new(2.0, 0.0, 0.0), a, b, c), 1.0);
    // Beyond the hypotenuse.
    assert_relative_eq!(
        point_triangle_distance_squared(DVec3::new(1.0, 1.0, 0.0), a, b, c),
        0.5,
        epsilon = 1e-14
    );
}

// ─── Broad Phase Tests ────────────────────────────────────────

#[test]
fn broad_phase_only_pairs_different_bodies() {
    let bodies = two_squares(1e-4);
    let poses = bodies.rest_poses();
    let candidates = BruteForceBroadPhase
        .detect_candidates_at(&bodies, &poses, CollisionKinds::for_dim(2), 1e-3)
        .unwrap();
    assert!(!candidates.ev.is_empty());
    assert!(candidates.ee.is_empty() && candidates.fv.is_empty());
    for c in &candidates.ev {
        let (edge_body, _) = bodies.global_to_local_edge(c.edge);
        assert_ne!(edge_body, bodies.vertex_body(c.vertex));
    }
}

#[test]
fn broad_phase_far_apart_is_empty() {
    let bodies = two_squares(5.0);
    let poses = bodies.rest_poses();
    for broad in [&BruteForceBroadPhase as &dyn BroadPhase, &HashGrid::new()] {
        let candidates = broad
            .detect_candidates_at(&bodies, &poses, CollisionKinds::for_dim(2), 1e-3)
            .unwrap();
        assert!(candidates.is_empty(), "{}", broad.name());
    }
}

#[test]
fn broad_phase_sweeps_motion() {
    let bodies = two_squares(5.0);
    let t0 = bodies.rest_poses();
    let t1 = vec![t0[0], Pose::planar(0.5, 0.0, 0.0)];
    let candidates = BruteForceBroadPhase
        .detect_candidates(&bodies, &t0, &t1, CollisionKinds::for_dim(2), 0.0)
        .unwrap();
    assert!(!candidates.is_empty());
}

#[test]
fn broad_phase_skips_static_pairs() {
    let a = square(0.5, Pose::planar(0.0, 0.0, 0.0)).unwrap().into_static();
    let b = square(0.5, Pose::planar(1.0, 0.0, 0.0)).unwrap().into_static();
    let bodies = RigidBodyAssembler::new(vec![a, b]).unwrap();
    let candidates = BruteForceBroadPhase
        .detect_candidates_at(&bodies, &bodies.rest_poses(), CollisionKinds::for_dim(2), 0.1)
        .unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn hash_grid_matches_brute_force_planar() {
    let bodies = RigidBodyAssembler::new(vec![
        square(0.5, Pose::planar(0.0, 0.0, 0.0)).unwrap(),
        square(0.3, Pose::planar(0.85, 0.2, 0.4)).unwrap(),
        square(0.4, Pose::planar(-0.3, 0.95, -0.2)).unwrap(),
    ])
    .unwrap();
    let t0 = bodies.rest_poses();
    let t1 = vec![t0[0], Pose::planar(0.6, 0.1, 0.9), Pose::planar(-0.2, 0.7, 0.0)];
    let kinds = CollisionKinds::for_dim(2);

    let brute = BruteForceBroadPhase.detect_candidates(&bodies, &t0, &t1, kinds, 0.05).unwrap();
    for grid in [HashGrid::new(), HashGrid::with_cell_size(0.05), HashGrid::with_cell_size(10.0)] {
        let hashed = grid.detect_candidates(&bodies, &t0, &t1, kinds, 0.05).unwrap();
        assert_eq!(hashed, brute);
    }
}

#[test]
fn hash_grid_matches_brute_force_volumetric() {
    let bodies = two_cubes(0.01);
    let poses = bodies.rest_poses();
    let kinds = CollisionKinds::for_dim(3);

    let brute = BruteForceBroadPhase.detect_candidates_at(&bodies, &poses, kinds, 0.02).unwrap();
    let hashed = HashGrid::new().detect_candidates_at(&bodies, &poses, kinds, 0.02).unwrap();
    assert!(!brute.ee.is_empty());
    assert!(!brute.fv.is_empty());
    assert_eq!(hashed, brute);
}

#[test]
fn broad_phase_rejects_wrong_pose_count() {
    let bodies = two_squares(0.1);
    let result = BruteForceBroadPhase.detect_candidates_at(
        &bodies,
        &[Pose::identity()],
        CollisionKinds::for_dim(2),
        0.0
    );
    assert!(result.is_err());
}

// ─── Narrow Phase Tests ───────────────────────────────────────

#[test]
fn earliest_toi_is_minimum_of_colliding() {
    let bodies = two_squares(0.1);
    let poses = bodies.rest_poses();
    let candidates: Candidates = [ev(0, 4), ev(1, 5), ev(2, 6)].into_iter().collect();
    let ccd = ScriptedCcd::new([(ev(0, 4), 0.4), (ev(2, 6), 0.2)]);

    let narrow = NarrowPhaseEvaluator::new(&ccd, &bodies, &poses, &poses);
    assert_eq!(narrow.earliest_time_of_impact(&candidates), 0.2);

    let summary = narrow.impact_summary(&candidates);
    assert_eq!(summary.num_candidates, 3);
    assert_eq!(summary.num_collisions, 2);
    assert!(narrow.has_active_collisions(&candidates));
}

#[test]
fn earliest_toi_without_collisions_is_infinite() {
    let bodies = two_squares(0.1);
    let poses = bodies.rest_poses();
    let candidates: Candidates = [ev(0, 4), ev(1, 5)].into_iter().collect();
    let ccd = ScriptedCcd::always(None);

    let narrow = NarrowPhaseEvaluator::new(&ccd, &bodies, &poses, &poses);
    assert_eq!(narrow.earliest_time_of_impact(&candidates), f64::INFINITY);
    assert!(!narrow.has_active_collisions(&candidates));
    assert_eq!(narrow.earliest_time_of_impact(&Candidates::new()), f64::INFINITY);
}

#[test]
fn earliest_toi_hints_never_exceed_step() {
    let bodies = two_squares(0.1);
    let poses = bodies.rest_poses();
    let candidates: Candidates = (0..4)
        .flat_map(|e| (4..8).map(move |v| ev(e, v)))
        .collect();
    let tois = candidates.iter().enumerate().map(|(i, c)| (c, 0.9 - 0.05 * i as f64));
    let ccd = ScriptedCcd::new(tois);
    let log = Arc::clone(&ccd.log);

    let narrow = NarrowPhaseEvaluator::new(&ccd, &bodies, &poses, &poses);
    assert_relative_eq!(narrow.earliest_time_of_impact(&candidates), 0.9 - 0.05 * 15.0);
    assert_eq!(log.calls.load(Ordering::SeqCst), 16);
    assert!(log.hints.lock().unwrap().iter().all(|&h| h <= 1.0 && h >= 0.9 - 0.05 * 15.0));
}

#[test]
fn has_active_collisions_stops_at_first_hit() {
    let bodies = two_squares(0.1);
    let poses = bodies.rest_poses();
    let candidates = Candidates {
        ev: vec![EdgeVertexCandidate::new(0, 4)],
        ee: vec![EdgeEdgeCandidate::new(0, 4)],
        fv: Vec::new(),
    };
    let ccd = ScriptedCcd::always(Some(0.5));
    let log = Arc::clone(&ccd.log);

    let narrow = NarrowPhaseEvaluator::new(&ccd, &bodies, &poses, &poses)
        .with_trajectory(TrajectoryType::PiecewiseLinear)
        .with_minimum_separation(0.01);
    assert!(narrow.has_active_collisions(&candidates));
    assert_eq!(log.calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.trajectories.lock().unwrap()[0], TrajectoryType::Rigid);
    assert_eq!(log.separations.lock().unwrap()[0], 0.0);
}

#[test]
fn zero_toi_reaches_hook_once() {
    let bodies = two_squares(0.1);
    let poses = bodies.rest_poses();
    let candidates: Candidates = [ev(1, 4)].into_iter().collect();
    let ccd = ScriptedCcd::always(Some(0.0));
    let hook = CollectingHook::new();

    let narrow = NarrowPhaseEvaluator::new(&ccd, &bodies, &poses, &poses)
        .with_hook(Some(&hook as &dyn ImpactHook));
    assert_eq!(narrow.earliest_time_of_impact(&candidates), 0.0);

    let snapshots = hook.snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].kind, CandidateKind::EdgeVertex);
    assert_eq!(snapshots[0].primitive("edge").unwrap().vertices.len(), 2);

    // Existence queries never report.
    assert!(narrow.has_active_collisions(&candidates));
    assert_eq!(hook.len(), 1);
}

// ─── Distance Barrier Constraint Tests ────────────────────────

fn constraint_with_builder(builds: &Arc<AtomicUsize>) -> DistanceBarrierConstraint {
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)))
        .with_settings(DistanceBarrierSettings::planar())
        .unwrap()
        .with_constraint_builder(Box::new(CountingBuilder {
            builds: Arc::clone(builds),
        }));
    constraint.initialize();
    constraint
}

#[test]
fn initialize_seeds_activation_distance() {
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)));
    assert_eq!(constraint.barrier_activation_distance(), 0.0);
    constraint.initialize();
    assert_eq!(constraint.barrier_activation_distance(), 1e-3);
    constraint.set_barrier_activation_distance(2e-3);
    assert_eq!(constraint.barrier_activation_distance(), 2e-3);
}

#[test]
fn constraint_set_cache_hit_returns_same_set() {
    let builds = Arc::new(AtomicUsize::new(0));
    let constraint = constraint_with_builder(&builds);
    let bodies = two_squares(1e-4);
    let poses = bodies.rest_poses();

    let first = constraint.construct_constraint_set(&bodies, &poses).unwrap();
    let second = constraint.construct_constraint_set(&bodies, &poses).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(first.len(), 8);
    assert_eq!(first.count(CandidateKind::EdgeVertex), 8);
    assert_eq!(first.count(CandidateKind::FaceVertex), 0);
}

#[test]
fn constraint_set_rebuilds_on_new_poses() {
    let builds = Arc::new(AtomicUsize::new(0));
    let constraint = constraint_with_builder(&builds);
    let bodies = two_squares(1e-4);
    let poses = bodies.rest_poses();

    let first = constraint.construct_constraint_set(&bodies, &poses).unwrap();
    let moved = vec![poses[0], Pose::planar(1.0002, 0.0, 0.0)];
    let second = constraint.construct_constraint_set(&bodies, &moved).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn constraint_set_rebuilds_when_dhat_changes() {
    let builds = Arc::new(AtomicUsize::new(0));
    let mut constraint = constraint_with_builder(&builds);
    let bodies = two_squares(5e-3);
    let poses = bodies.rest_poses();

    assert!(constraint.construct_constraint_set(&bodies, &poses).unwrap().is_empty());
    constraint.set_barrier_activation_distance(1e-2);
    assert_eq!(constraint.construct_constraint_set(&bodies, &poses).unwrap().len(), 8);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn single_body_has_empty_constraint_set() {
    let builds = Arc::new(AtomicUsize::new(0));
    let constraint = constraint_with_builder(&builds);
    let bodies = RigidBodyAssembler::new(vec![square(0.5, Pose::identity()).unwrap()]).unwrap();
    let set = constraint.construct_constraint_set(&bodies, &bodies.rest_poses()).unwrap();
    assert!(set.is_empty());
    assert_eq!(builds.load(Ordering::SeqCst), 0);
    assert_eq!(
        constraint.compute_minimum_distance(&bodies, &bodies.rest_poses()).unwrap(),
        f64::INFINITY
    );
}

#[test]
fn minimum_distance_and_barrier_values() {
    let builds = Arc::new(AtomicUsize::new(0));
    let constraint = constraint_with_builder(&builds);
    let gap = 1e-4;
    let bodies = two_squares(gap);
    let poses = bodies.rest_poses();

    let d = constraint.compute_minimum_distance(&bodies, &poses).unwrap();
    assert_relative_eq!(d, gap, max_relative = 1e-9);

    let barriers = constraint.compute_constraints(&bodies, &poses).unwrap();
    assert_eq!(barriers.len(), 8);
    let expected = barrier(gap, 1e-3, BarrierType::Ipc);
    for b in barriers {
        assert_relative_eq!(b, expected, max_relative = 1e-6);
    }
}

#[test]
fn distance_barrier_applies_minimum_separation() {
    let settings = DistanceBarrierSettings {
        minimum_separation_distance: 0.01,
        ..Default::default()
    };
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)))
        .with_settings(settings)
        .unwrap();
    constraint.initialize();
    let dhat = constraint.barrier_activation_distance();

    assert_eq!(
        constraint.distance_barrier(0.0105, dhat),
        barrier(0.0105 - 0.01, dhat, BarrierType::Ipc)
    );
    assert_eq!(constraint.barrier_at(0.005), f64::INFINITY);
    assert_eq!(constraint.barrier_gradient_at(0.02), 0.0);
    assert_eq!(
        constraint.barrier_hessian_at(0.0105),
        barrier_hessian(0.0105 - 0.01, dhat, BarrierType::Ipc)
    );
}

#[test]
fn collision_queries_use_configured_ccd() {
    let ccd = ScriptedCcd::always(Some(0.25));
    let log = Arc::clone(&ccd.log);
    let hook = Arc::new(CollectingHook::new());
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ccd))
        .with_settings(DistanceBarrierSettings::planar())
        .unwrap()
        .with_impact_hook(hook.clone());
    constraint.initialize();

    let bodies = two_squares(0.1);
    let t0 = bodies.rest_poses();
    let t1 = vec![t0[0], Pose::planar(0.8, 0.0, 0.0)];

    assert!(constraint.has_active_collisions(&bodies, &t0, &t1).unwrap());
    assert_eq!(constraint.compute_earliest_toi(&bodies, &t0, &t1).unwrap(), 0.25);
    assert!(log.calls.load(Ordering::SeqCst) > 1);
    assert!(hook.is_empty());

    // Nothing moves into range: no candidates, no CCD calls.
    let far = two_squares(5.0);
    let calls_before = log.calls.load(Ordering::SeqCst);
    let rest = far.rest_poses();
    assert_eq!(constraint.compute_earliest_toi(&far, &rest, &rest).unwrap(), f64::INFINITY);
    assert!(!constraint.has_active_collisions(&far, &rest, &rest).unwrap());
    assert_eq!(log.calls.load(Ordering::SeqCst), calls_before);
}

#[test]
fn zero_toi_through_constraint_reports_every_collision() {
    let hook = Arc::new(CollectingHook::new());
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(Some(0.0))))
        .with_settings(DistanceBarrierSettings::planar())
        .unwrap()
        .with_impact_hook(hook.clone());
    constraint.initialize();

    let bodies = two_squares(0.1);
    let t0 = bodies.rest_poses();
    let t1 = vec![t0[0], Pose::planar(0.8, 0.0, 0.0)];
    let summary = constraint.impact_summary(&bodies, &t0, &t1).unwrap();
    assert_eq!(summary.earliest_toi, 0.0);
    assert_eq!(hook.len(), summary.num_collisions);
}

#[test]
fn settings_json_round_trip() {
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)));
    let json = constraint.settings_json().unwrap();
    assert_eq!(json["barrier_type"], "ipc");
    assert_eq!(json["initial_barrier_activation_distance"], 1e-3);

    let partial = serde_json::json!({
        "barrier_type": "poly_log",
        "minimum_separation_distance": 1e-4,
        "detection_method": "brute_force"
    });
    constraint.apply_settings_json(&partial).unwrap();
    assert_eq!(constraint.barrier_type(), BarrierType::PolyLog);
    assert_eq!(constraint.minimum_separation_distance(), 1e-4);
    assert_eq!(constraint.settings().detection_method, DetectionMethod::BruteForce);
    assert_eq!(constraint.settings().initial_barrier_activation_distance, 1e-3);
}

#[test]
fn invalid_settings_are_rejected() {
    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)));
    let bad = DistanceBarrierSettings {
        initial_barrier_activation_distance: 0.0,
        ..Default::default()
    };
    assert!(constraint.apply_settings(bad).is_err());
    assert!(constraint
        .apply_settings_json(&serde_json::json!({ "barrier_type": "quadratic" }))
        .is_err());
    assert_eq!(constraint.settings(), &DistanceBarrierSettings::default());
}

#[test]
fn builder_settings_are_validated() {
    let negative = DistanceBarrierSettings {
        initial_barrier_activation_distance: -1e-3,
        ..Default::default()
    };
    let result = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)))
        .with_settings(negative);
    assert!(matches!(result, Err(ImpasseError::InvalidConfig(_))));

    let mut constraint = DistanceBarrierConstraint::new(Box::new(ScriptedCcd::always(None)))
        .with_settings(DistanceBarrierSettings::planar())
        .unwrap();
    constraint.initialize();
    assert!(constraint.barrier_activation_distance() > 0.0);
}
