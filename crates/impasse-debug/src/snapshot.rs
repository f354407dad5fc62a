//! Self-contained snapshots of a colliding primitive pair.
//!
//! A snapshot records body-frame vertex coordinates and both poses of
//! each body involved, which is everything needed to replay the CCD
//! query without the rest of the scene.

use glam::DVec3;
use impasse_body::{Pose, RigidBodyAssembler};
use impasse_types::{CandidateKind, EdgeId, FaceId, ImpasseError, ImpasseResult, VertexId};
use serde::{Deserialize, Serialize};

/// One primitive of a colliding pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSnapshot {
    /// Role of this primitive in the pair (`"edge"`, `"vertex"`, `"face"`,
    /// `"edge0"`, `"edge1"`).
    pub role: String,
    /// Body-frame coordinates of the primitive's vertices.
    pub vertices: Vec<DVec3>,
    /// Pose of the owning body at the start of the step.
    pub pose_t0: Pose,
    /// Pose of the owning body at the end of the step.
    pub pose_t1: Pose,
}

/// A colliding primitive pair captured for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSnapshot {
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub primitives: Vec<PrimitiveSnapshot>,
}

struct Capture<'a> {
    bodies: &'a RigidBodyAssembler,
    poses_t0: &'a [Pose],
    poses_t1: &'a [Pose],
}

impl Capture<'_> {
    fn vertex(&self, role: &str, vertex: VertexId) -> PrimitiveSnapshot {
        let (body, local) = self.bodies.global_to_local_vertex(vertex);
        self.primitive(role, body.index(), vec![self.bodies[body].vertices[local]])
    }

    fn edge(&self, role: &str, edge: EdgeId) -> PrimitiveSnapshot {
        let (body, local) = self.bodies.global_to_local_edge(edge);
        let b = &self.bodies[body];
        let vertices = b.edges[local].iter().map(|&v| b.vertices[v as usize]).collect();
        self.primitive(role, body.index(), vertices)
    }

    fn face(&self, role: &str, face: FaceId) -> PrimitiveSnapshot {
        let (body, local) = self.bodies.global_to_local_face(face);
        let b = &self.bodies[body];
        let vertices = b.faces[local].iter().map(|&v| b.vertices[v as usize]).collect();
        self.primitive(role, body.index(), vertices)
    }

    fn primitive(&self, role: &str, body: usize, vertices: Vec<DVec3>) -> PrimitiveSnapshot {
        PrimitiveSnapshot {
            role: role.to_string(),
            vertices,
            pose_t0: self.poses_t0[body],
            pose_t1: self.poses_t1[body],
        }
    }
}

impl ImpactSnapshot {
    /// Captures an edge-vertex pair.
    pub fn edge_vertex(
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        edge: EdgeId,
        vertex: VertexId,
    ) -> Self {
        let c = Capture { bodies, poses_t0, poses_t1 };
        Self {
            kind: CandidateKind::EdgeVertex,
            primitives: vec![c.edge("edge", edge), c.vertex("vertex", vertex)],
        }
    }

    /// Captures an edge-edge pair.
    pub fn edge_edge(
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        edge0: EdgeId,
        edge1: EdgeId,
    ) -> Self {
        let c = Capture { bodies, poses_t0, poses_t1 };
        Self {
            kind: CandidateKind::EdgeEdge,
            primitives: vec![c.edge("edge0", edge0), c.edge("edge1", edge1)],
        }
    }

    /// Captures a face-vertex pair.
    pub fn face_vertex(
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        face: FaceId,
        vertex: VertexId,
    ) -> Self {
        let c = Capture { bodies, poses_t0, poses_t1 };
        Self {
            kind: CandidateKind::FaceVertex,
            primitives: vec![c.face("face", face), c.vertex("vertex", vertex)],
        }
    }

    /// Finds a primitive by role.
    pub fn primitive(&self, role: &str) -> Option<&PrimitiveSnapshot> {
        self.primitives.iter().find(|p| p.role == role)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> ImpasseResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ImpasseError::Serialization(e.to_string()))
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> ImpasseResult<Self> {
        serde_json::from_str(json).map_err(|e| ImpasseError::Serialization(e.to_string()))
    }

    /// Serializes to compact binary format.
    pub fn to_bytes(&self) -> ImpasseResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| ImpasseError::Serialization(e.to_string()))
    }

    /// Deserializes from binary format.
    pub fn from_bytes(data: &[u8]) -> ImpasseResult<Self> {
        bincode::deserialize(data).map_err(|e| {
            ImpasseError::Serialization(format!("Snapshot deserialization failed: {e}"))
        })
    }
}
