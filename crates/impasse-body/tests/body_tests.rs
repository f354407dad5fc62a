//! Integration tests for impasse-body.

use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use impasse_body::generators::{cuboid, segment, square, triangle};
use impasse_body::topology::{is_closed, unique_edges};
use impasse_body::{poses_from_dofs, poses_to_dofs, Pose, RigidBody, RigidBodyAssembler};
use impasse_math::DVec3;
use impasse_types::{BodyId, EdgeId, FaceId, VertexId};

// ─── Pose Tests ───────────────────────────────────────────────

#[test]
fn planar_rotation_quarter_turn() {
    let pose = Pose::planar(1.0, 0.0, FRAC_PI_2);
    let p = pose.transform_point(DVec3::X);
    assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
    assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
}

#[test]
fn pose_lerp_midpoint() {
    let a = Pose::planar(0.0, 0.0, 0.0);
    let b = Pose::planar(2.0, 4.0, 1.0);
    let m = a.lerp(&b, 0.5);
    assert_eq!(m, Pose::planar(1.0, 2.0, 0.5));
}

#[test]
fn pose_serde_round_trip() {
    let pose = Pose::new(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.1, 0.2, 0.3));
    let json = serde_json::to_string(&pose).unwrap();
    let back: Pose = serde_json::from_str(&json).unwrap();
    assert_eq!(pose, back);
}

#[test]
fn dofs_layout_2d_and_3d() {
    let poses = vec![Pose::planar(1.0, 2.0, 0.5), Pose::planar(-1.0, 0.0, 0.0)];
    let x = poses_to_dofs(&poses, 2).unwrap();
    assert_eq!(x, vec![1.0, 2.0, 0.5, -1.0, 0.0, 0.0]);
    assert_eq!(poses_from_dofs(&x, 2).unwrap(), poses);

    let x3 = vec![1.0, 2.0, 3.0, 0.1, 0.2, 0.3];
    let poses3 = poses_from_dofs(&x3, 3).unwrap();
    assert_eq!(poses3[0].rotation, DVec3::new(0.1, 0.2, 0.3));
    assert_eq!(poses_to_dofs(&poses3, 3).unwrap(), x3);
}

#[test]
fn dofs_reject_bad_length_and_dim() {
    assert!(poses_from_dofs(&[1.0, 2.0], 2).is_err());
    assert!(poses_from_dofs(&[1.0, 2.0, 3.0], 4).is_err());
}

// ─── Body Tests ───────────────────────────────────────────────

#[test]
fn cuboid_is_closed_with_derived_edges() {
    let body = cuboid(DVec3::splat(0.5), Pose::identity()).unwrap();
    assert_eq!(body.vertex_count(), 8);
    assert_eq!(body.faces.len(), 12);
    assert_eq!(body.edges.len(), 18);
    assert!(is_closed(&body.faces));
    assert_eq!(body.ndof(), 6);
}

#[test]
fn unique_edges_is_sorted_and_deduplicated() {
    let edges = unique_edges(&[[0, 1, 2], [2, 1, 3]]);
    assert_eq!(edges, vec![[0, 1], [0, 2], [1, 2], [1, 3], [2, 3]]);
    assert!(!is_closed(&[[0, 1, 2]]));
}

#[test]
fn body_rejects_out_of_range_edge() {
    let result = RigidBody::new(
        vec![DVec3::ZERO, DVec3::X],
        vec![[0, 2]],
        Vec::new(),
        Pose::identity(),
        2,
    );
    assert!(result.is_err());
}

#[test]
fn planar_body_rejects_faces() {
    let result = RigidBody::new(
        vec![DVec3::ZERO, DVec3::X, DVec3::Y],
        Vec::new(),
        vec![[0, 1, 2]],
        Pose::identity(),
        2,
    );
    assert!(result.is_err());
}

#[test]
fn body_rejects_non_finite_rest_pose() {
    let pose = Pose::planar(f64::NAN, 0.0, 0.0);
    assert!(!pose.is_finite());
    assert!(square(0.5, pose).is_err());
    assert!(square(0.5, Pose::planar(1.0, 2.0, 0.3)).is_ok());
}

#[test]
fn fixed_dof_mask_must_match() {
    let body = square(0.5, Pose::identity()).unwrap();
    assert!(body.clone().with_fixed_dofs(vec![true; 2]).is_err());
    let fixed = body.into_static();
    assert!(fixed.is_dof_fixed.iter().all(|&f| f));
}

// ─── Assembler Tests ──────────────────────────────────────────

fn two_squares() -> RigidBodyAssembler {
    let a = square(0.5, Pose::planar(0.0, 0.0, 0.0)).unwrap();
    let b = square(0.5, Pose::planar(2.0, 0.0, 0.0)).unwrap();
    RigidBodyAssembler::new(vec![a, b]).unwrap()
}

#[test]
fn assembler_global_numbering() {
    let bodies = two_squares();
    assert_eq!(bodies.num_bodies(), 2);
    assert_eq!(bodies.num_vertices(), 8);
    assert_eq!(bodies.num_edges(), 8);
    assert_eq!(bodies.edges()[4], [4, 5]);
    assert_eq!(bodies.global_to_local_vertex(VertexId(5)), (BodyId(1), 1));
    assert_eq!(bodies.global_to_local_edge(EdgeId(3)), (BodyId(0), 3));
    assert_eq!(bodies.body_dof_range(BodyId(1)), 3..6);
}

#[test]
fn assembler_world_vertices() {
    let bodies = two_squares();
    let poses = bodies.rest_poses();
    let world = bodies.world_vertices(&poses).unwrap();
    assert_eq!(world.len(), 8);
    assert_relative_eq!(world[4].x, 1.5, epsilon = 1e-12);
    assert_eq!(bodies.world_vertex(&poses, VertexId(4)), world[4]);
}

#[test]
fn assembler_rejects_wrong_pose_count() {
    let bodies = two_squares();
    assert!(bodies.world_vertices(&[Pose::identity()]).is_err());
}

#[test]
fn assembler_rejects_mixed_dimensions() {
    let a = segment([0.0, 0.0], [1.0, 0.0], Pose::identity()).unwrap();
    let b = triangle(DVec3::ZERO, DVec3::X, DVec3::Y, Pose::identity()).unwrap();
    assert!(RigidBodyAssembler::new(vec![a, b]).is_err());
}

#[test]
fn assembler_face_lookup_skips_faceless_bodies() {
    let a = triangle(DVec3::ZERO, DVec3::X, DVec3::Y, Pose::identity()).unwrap();
    let b = cuboid(DVec3::splat(1.0), Pose::identity()).unwrap();
    let bodies = RigidBodyAssembler::new(vec![a, b]).unwrap();
    assert_eq!(bodies.global_to_local_face(FaceId(0)), (BodyId(0), 0));
    assert_eq!(bodies.global_to_local_face(FaceId(5)), (BodyId(1), 4));
    assert_eq!(bodies.faces()[1], [3, 5, 4]);
    assert_eq!(bodies[BodyId(1)].vertex_count(), 8);
}
