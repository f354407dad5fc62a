//! Procedural rigid body generators for tests and demos.
//!
//! These generators produce deterministic bodies centered at their
//! body-frame origin, with counter-clockwise winding.

use glam::DVec3;
use impasse_types::ImpasseResult;

use crate::body::RigidBody;
use crate::pose::Pose;

/// A planar segment from `a` to `b` (XY plane).
pub fn segment(a: [f64; 2], b: [f64; 2], pose: Pose) -> ImpasseResult<RigidBody> {
    RigidBody::new(
        vec![DVec3::new(a[0], a[1], 0.0), DVec3::new(b[0], b[1], 0.0)],
        vec![[0, 1]],
        Vec::new(),
        pose,
        2,
    )
}

/// A planar axis-aligned square with the given half extent.
///
/// # Example
/// ```
/// use impasse_body::generators::square;
/// use impasse_body::Pose;
/// let body = square(0.5, Pose::identity()).unwrap();
/// assert_eq!(body.vertex_count(), 4);
/// assert_eq!(body.edges.len(), 4);
/// ```
pub fn square(half_extent: f64, pose: Pose) -> ImpasseResult<RigidBody> {
    let h = half_extent;
    RigidBody::new(
        vec![
            DVec3::new(-h, -h, 0.0),
            DVec3::new(h, -h, 0.0),
            DVec3::new(h, h, 0.0),
            DVec3::new(-h, h, 0.0),
        ],
        vec![[0, 1], [1, 2], [2, 3], [3, 0]],
        Vec::new(),
        pose,
        2,
    )
}

/// A closed triangulated box (8 vertices, 12 faces, 18 edges).
pub fn cuboid(half_extents: DVec3, pose: Pose) -> ImpasseResult<RigidBody> {
    let h = half_extents;
    let vertices = (0..8)
        .map(|i| {
            DVec3::new(
                if i & 1 == 0 { -h.x } else { h.x },
                if i & 2 == 0 { -h.y } else { h.y },
                if i & 4 == 0 { -h.z } else { h.z },
            )
        })
        .collect();

    // Outward-facing triangles, two per box side.
    let faces = vec![
        [0, 2, 1],
        [1, 2, 3],
        [4, 5, 6],
        [5, 7, 6],
        [0, 1, 4],
        [1, 5, 4],
        [2, 6, 3],
        [3, 6, 7],
        [0, 4, 2],
        [2, 4, 6],
        [1, 3, 5],
        [3, 7, 5],
    ];

    RigidBody::new(vertices, Vec::new(), faces, pose, 3)
}

/// A single triangle in 3D, useful as a thin obstacle.
pub fn triangle(a: DVec3, b: DVec3, c: DVec3, pose: Pose) -> ImpasseResult<RigidBody> {
    RigidBody::new(vec![a, b, c], Vec::new(), vec![[0, 1, 2]], pose, 3)
}
