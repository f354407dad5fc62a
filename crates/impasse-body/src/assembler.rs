//! Assembly of many rigid bodies into one global primitive numbering.
//!
//! Global vertex, edge and face ids are the concatenation of each
//! body's local lists in body order. Global edges and faces reference
//! global vertex ids.

use std::ops::Index;

use glam::DVec3;
use impasse_types::{BodyId, EdgeId, FaceId, ImpasseError, ImpasseResult, VertexId};

use crate::body::RigidBody;
use crate::pose::Pose;

/// All rigid bodies of a scene, with global primitive numbering.
#[derive(Debug, Clone)]
pub struct RigidBodyAssembler {
    bodies: Vec<RigidBody>,
    dim: usize,
    /// `vertex_offsets[i]..vertex_offsets[i+1]` are the global vertex ids of body `i`.
    vertex_offsets: Vec<usize>,
    edge_offsets: Vec<usize>,
    face_offsets: Vec<usize>,
    edges: Vec<[u32; 2]>,
    faces: Vec<[u32; 3]>,
}

impl RigidBodyAssembler {
    /// Assembles bodies. All bodies must share one dimension.
    pub fn new(bodies: Vec<RigidBody>) -> ImpasseResult<Self> {
        let dim = bodies.first().map_or(3, |b| b.dim);
        if let Some(b) = bodies.iter().find(|b| b.dim != dim) {
            return Err(ImpasseError::InvalidBody(format!(
                "Mixed dimensions: expected {dim}, found {}",
                b.dim
            )));
        }

        let mut vertex_offsets = vec![0usize];
        let mut edge_offsets = vec![0usize];
        let mut face_offsets = vec![0usize];
        let mut edges = Vec::new();
        let mut faces = Vec::new();

        for body in &bodies {
            body.validate()?;
            let v0 = *vertex_offsets.last().unwrap_or(&0) as u32;
            edges.extend(body.edges.iter().map(|&[a, b]| [a + v0, b + v0]));
            faces.extend(body.faces.iter().map(|&[a, b, c]| [a + v0, b + v0, c + v0]));
            vertex_offsets.push(v0 as usize + body.vertex_count());
            edge_offsets.push(edges.len());
            face_offsets.push(faces.len());
        }

        Ok(Self {
            bodies,
            dim,
            vertex_offsets,
            edge_offsets,
            face_offsets,
            edges,
            faces,
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_offsets[self.bodies.len()]
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Global edges (global vertex ids).
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    /// Global faces (global vertex ids).
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Total number of degrees of freedom.
    pub fn ndof(&self) -> usize {
        self.bodies.iter().map(RigidBody::ndof).sum()
    }

    /// Concatenated fixed-dof mask of all bodies.
    pub fn is_dof_fixed(&self) -> Vec<bool> {
        self.bodies
            .iter()
            .flat_map(|b| b.is_dof_fixed.iter().copied())
            .collect()
    }

    /// Rest pose of every body.
    pub fn rest_poses(&self) -> Vec<Pose> {
        self.bodies.iter().map(|b| b.pose).collect()
    }

    /// Checks that `poses` has one entry per body.
    pub fn check_poses(&self, poses: &[Pose]) -> ImpasseResult<()> {
        if poses.len() != self.bodies.len() {
            return Err(ImpasseError::DimensionMismatch {
                what: "poses",
                expected: self.bodies.len(),
                found: poses.len(),
            });
        }
        Ok(())
    }

    /// World-space positions of every global vertex.
    pub fn world_vertices(&self, poses: &[Pose]) -> ImpasseResult<Vec<DVec3>> {
        self.check_poses(poses)?;
        let mut out = Vec::with_capacity(self.num_vertices());
        for (body, pose) in self.bodies.iter().zip(poses) {
            out.extend(body.world_vertices(pose));
        }
        Ok(out)
    }

    /// World-space position of one global vertex.
    ///
    /// `poses` must have one entry per body.
    pub fn world_vertex(&self, poses: &[Pose], vertex: VertexId) -> DVec3 {
        let (body, local) = self.global_to_local_vertex(vertex);
        poses[body.index()].transform_point(self.bodies[body.index()].vertices[local])
    }

    /// Body owning a global vertex, and the vertex index within it.
    pub fn global_to_local_vertex(&self, vertex: VertexId) -> (BodyId, usize) {
        locate(&self.vertex_offsets, vertex.index())
    }

    /// Body owning a global edge, and the edge index within it.
    pub fn global_to_local_edge(&self, edge: EdgeId) -> (BodyId, usize) {
        locate(&self.edge_offsets, edge.index())
    }

    /// Body owning a global face, and the face index within it.
    pub fn global_to_local_face(&self, face: FaceId) -> (BodyId, usize) {
        locate(&self.face_offsets, face.index())
    }

    /// Body owning a global vertex.
    pub fn vertex_body(&self, vertex: VertexId) -> BodyId {
        self.global_to_local_vertex(vertex).0
    }

    /// Dof index range of a body in the flat dof vector.
    pub fn body_dof_range(&self, body: BodyId) -> std::ops::Range<usize> {
        let start: usize = self.bodies[..body.index()].iter().map(RigidBody::ndof).sum();
        start..start + self.bodies[body.index()].ndof()
    }
}

impl Index<BodyId> for RigidBodyAssembler {
    type Output = RigidBody;

    fn index(&self, id: BodyId) -> &RigidBody {
        &self.bodies[id.index()]
    }
}

/// Finds the last offset bucket containing `global`; empty buckets are skipped.
fn locate(offsets: &[usize], global: usize) -> (BodyId, usize) {
    let body = offsets.partition_point(|&o| o <= global).saturating_sub(1);
    (BodyId(body as u32), global - offsets[body])
}
