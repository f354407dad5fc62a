//! Broad phase candidate generation.
//!
//! Quickly identifies *candidate* primitive pairs whose inflated
//! swept bounding boxes overlap. The narrow phase then runs exact CCD
//! or distance queries on these candidates only.
//!
//! Only pairs from different bodies are generated, and pairs where both
//! bodies are completely fixed are skipped.

use impasse_body::{Pose, RigidBodyAssembler};
use impasse_math::DVec3;
use impasse_types::{BodyId, EdgeId, FaceId, ImpasseResult, VertexId};

use crate::candidates::{
    Candidates, CollisionKinds, EdgeEdgeCandidate, EdgeVertexCandidate, FaceVertexCandidate,
};

/// Number of pose samples between `t0` and `t1` used to bound a swept vertex.
const SWEEP_SAMPLES: usize = 8;

/// Trait for broad phase candidate detection.
///
/// # Implementations
/// - [`BruteForceBroadPhase`]: tests every inter-body pair
/// - [`HashGrid`](crate::hash_grid::HashGrid): uniform grid, same output
pub trait BroadPhase: Send + Sync {
    /// Candidates for motion from `poses_t0` to `poses_t1`.
    fn detect_candidates(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        kinds: CollisionKinds,
        inflation_radius: f64,
    ) -> ImpasseResult<Candidates>;

    /// Candidates for a single static configuration.
    fn detect_candidates_at(
        &self,
        bodies: &RigidBodyAssembler,
        poses: &[Pose],
        kinds: CollisionKinds,
        inflation_radius: f64,
    ) -> ImpasseResult<Candidates> {
        self.detect_candidates(bodies, poses, poses, kinds, inflation_radius)
    }

    /// Returns the broad phase strategy name.
    fn name(&self) -> &str;
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::INFINITY),
            max: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        points.into_iter().fold(Self::empty(), |b, p| b.expanded(p))
    }

    pub fn expanded(self, p: DVec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn inflated(self, radius: f64) -> Self {
        Self {
            min: self.min - DVec3::splat(radius),
            max: self.max + DVec3::splat(radius),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Largest side length.
    pub fn extent(&self) -> f64 {
        (self.max - self.min).max_element()
    }
}

/// Swept, inflated boxes of every primitive plus ownership data.
pub(crate) struct PrimitiveBoxes {
    pub vertices: Vec<Aabb>,
    pub edges: Vec<Aabb>,
    pub faces: Vec<Aabb>,
    pub vertex_body: Vec<BodyId>,
    pub edge_body: Vec<BodyId>,
    pub face_body: Vec<BodyId>,
    body_static: Vec<bool>,
}

impl PrimitiveBoxes {
    pub fn build(
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        inflation_radius: f64,
    ) -> ImpasseResult<Self> {
        bodies.check_poses(poses_t0)?;
        bodies.check_poses(poses_t1)?;

        let samples = if poses_t0 == poses_t1 { 0 } else { SWEEP_SAMPLES };
        let mut vertices: Vec<Aabb> = bodies
            .world_vertices(poses_t0)?
            .into_iter()
            .map(|p| Aabb::from_points([p]))
            .collect();
        for k in 1..=samples {
            let t = k as f64 / samples as f64;
            let poses: Vec<Pose> = poses_t0
                .iter()
                .zip(poses_t1)
                .map(|(a, b)| a.lerp(b, t))
                .collect();
            for (bbox, p) in vertices.iter_mut().zip(bodies.world_vertices(&poses)?) {
                *bbox = bbox.expanded(p);
            }
        }
        for bbox in &mut vertices {
            *bbox = bbox.inflated(inflation_radius);
        }

        let edges = bodies
            .edges()
            .iter()
            .map(|&[a, b]| vertices[a as usize].union(vertices[b as usize]))
            .collect();
        let faces = bodies
            .faces()
            .iter()
            .map(|&[a, b, c]| {
                vertices[a as usize]
                    .union(vertices[b as usize])
                    .union(vertices[c as usize])
            })
            .collect();

        let vertex_body = (0..bodies.num_vertices())
            .map(|v| bodies.global_to_local_vertex(VertexId(v as u32)).0)
            .collect();
        let edge_body = (0..bodies.num_edges())
            .map(|e| bodies.global_to_local_edge(EdgeId(e as u32)).0)
            .collect();
        let face_body = (0..bodies.num_faces())
            .map(|f| bodies.global_to_local_face(FaceId(f as u32)).0)
            .collect();
        let body_static = bodies
            .bodies()
            .iter()
            .map(|b| b.is_dof_fixed.iter().all(|&f| f))
            .collect();

        Ok(Self {
            vertices,
            edges,
            faces,
            vertex_body,
            edge_body,
            face_body,
            body_static,
        })
    }

    fn accepts(&self, body_a: BodyId, body_b: BodyId, a: &Aabb, b: &Aabb) -> bool {
        body_a != body_b
            && !(self.body_static[body_a.index()] && self.body_static[body_b.index()])
            && a.overlaps(b)
    }

    pub fn edge_vertex(&self, e: usize, v: usize) -> Option<EdgeVertexCandidate> {
        self.accepts(self.edge_body[e], self.vertex_body[v], &self.edges[e], &self.vertices[v])
            .then(|| EdgeVertexCandidate::new(e as u32, v as u32))
    }

    pub fn edge_edge(&self, e0: usize, e1: usize) -> Option<EdgeEdgeCandidate> {
        let (e0, e1) = (e0.min(e1), e0.max(e1));
        self.accepts(self.edge_body[e0], self.edge_body[e1], &self.edges[e0], &self.edges[e1])
            .then(|| EdgeEdgeCandidate::new(e0 as u32, e1 as u32))
    }

    pub fn face_vertex(&self, f: usize, v: usize) -> Option<FaceVertexCandidate> {
        self.accepts(self.face_body[f], self.vertex_body[v], &self.faces[f], &self.vertices[v])
            .then(|| FaceVertexCandidate::new(f as u32, v as u32))
    }
}

/// Tests every inter-body primitive pair.
///
/// Quadratic, but trivially correct. Useful for small scenes and as a
/// reference for faster broad phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceBroadPhase;

impl BroadPhase for BruteForceBroadPhase {
    fn detect_candidates(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        kinds: CollisionKinds,
        inflation_radius: f64,
    ) -> ImpasseResult<Candidates> {
        let boxes = PrimitiveBoxes::build(bodies, poses_t0, poses_t1, inflation_radius)?;
        let (nv, ne, nf) = (boxes.vertices.len(), boxes.edges.len(), boxes.faces.len());
        let mut candidates = Candidates::new();

        if kinds.edge_vertex {
            for e in 0..ne {
                candidates.ev.extend((0..nv).filter_map(|v| boxes.edge_vertex(e, v)));
            }
        }
        if kinds.edge_edge {
            for e0 in 0..ne {
                candidates.ee.extend((e0 + 1..ne).filter_map(|e1| boxes.edge_edge(e0, e1)));
            }
        }
        if kinds.face_vertex {
            for f in 0..nf {
                candidates.fv.extend((0..nv).filter_map(|v| boxes.face_vertex(f, v)));
            }
        }

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "brute_force"
    }
}
