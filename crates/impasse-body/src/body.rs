//! A single rigid body.

use glam::DVec3;
use impasse_types::{ImpasseError, ImpasseResult};
use serde::{Deserialize, Serialize};

use crate::pose::{dofs_per_body, Pose};
use crate::topology::unique_edges;

/// Rigid body geometry in its own frame, plus its rest pose.
///
/// Planar bodies (`dim == 2`) have vertices with `z == 0`, edges and no
/// faces. Volumetric bodies (`dim == 3`) have faces; when no edges are
/// given they are derived from the faces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    /// Vertex positions in the body frame.
    pub vertices: Vec<DVec3>,
    /// Edges as pairs of local vertex indices.
    pub edges: Vec<[u32; 2]>,
    /// Triangles as triples of local vertex indices.
    pub faces: Vec<[u32; 3]>,
    /// Rest pose.
    pub pose: Pose,
    /// Spatial dimension (2 or 3).
    pub dim: usize,
    /// Per-dof flag; fixed dofs never move.
    pub is_dof_fixed: Vec<bool>,
    /// Mass used by inertial energy terms.
    pub mass: f64,
}

impl RigidBody {
    /// Creates a body and validates its index buffers.
    pub fn new(
        vertices: Vec<DVec3>,
        edges: Vec<[u32; 2]>,
        faces: Vec<[u32; 3]>,
        pose: Pose,
        dim: usize,
    ) -> ImpasseResult<Self> {
        let ndof = dofs_per_body(dim)?;
        let edges = if edges.is_empty() && !faces.is_empty() {
            unique_edges(&faces)
        } else {
            edges
        };
        let body = Self {
            vertices,
            edges,
            faces,
            pose,
            dim,
            is_dof_fixed: vec![false; ndof],
            mass: 1.0,
        };
        body.validate()?;
        Ok(body)
    }

    /// Marks individual dofs as fixed.
    pub fn with_fixed_dofs(mut self, fixed: Vec<bool>) -> ImpasseResult<Self> {
        if fixed.len() != self.is_dof_fixed.len() {
            return Err(ImpasseError::DimensionMismatch {
                what: "fixed dof mask",
                expected: self.is_dof_fixed.len(),
                found: fixed.len(),
            });
        }
        self.is_dof_fixed = fixed;
        Ok(self)
    }

    /// Fixes every dof of this body (a static obstacle).
    pub fn into_static(mut self) -> Self {
        self.is_dof_fixed.iter_mut().for_each(|f| *f = true);
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn ndof(&self) -> usize {
        self.is_dof_fixed.len()
    }

    /// World-space positions of all vertices at `pose`.
    pub fn world_vertices(&self, pose: &Pose) -> Vec<DVec3> {
        let r = pose.rotation_matrix();
        self.vertices.iter().map(|&v| r * v + pose.position).collect()
    }

    /// Validates body integrity.
    ///
    /// Checks:
    /// - Edge and face indices are within bounds
    /// - No degenerate edges or faces (repeated vertex indices)
    /// - Planar bodies have no faces and only z == 0 vertices
    /// - The rest pose is finite
    pub fn validate(&self) -> ImpasseResult<()> {
        let n = self.vertices.len() as u32;

        for (i, e) in self.edges.iter().enumerate() {
            if e[0] >= n || e[1] >= n {
                return Err(ImpasseError::InvalidBody(format!(
                    "Edge {i} {e:?} is out of range (vertex count: {n})"
                )));
            }
            if e[0] == e[1] {
                return Err(ImpasseError::InvalidBody(format!(
                    "Edge {i} has repeated vertex index {}",
                    e[0]
                )));
            }
        }

        for (i, &[a, b, c]) in self.faces.iter().enumerate() {
            if a >= n || b >= n || c >= n {
                return Err(ImpasseError::InvalidBody(format!(
                    "Face {i} [{a}, {b}, {c}] is out of range (vertex count: {n})"
                )));
            }
            if a == b || b == c || a == c {
                return Err(ImpasseError::InvalidBody(format!(
                    "Face {i} has repeated vertex indices: [{a}, {b}, {c}]"
                )));
            }
        }

        if self.dim == 2 {
            if !self.faces.is_empty() {
                return Err(ImpasseError::InvalidBody(
                    "Planar bodies cannot have faces".into(),
                ));
            }
            if self.vertices.iter().any(|v| v.z != 0.0) {
                return Err(ImpasseError::InvalidBody(
                    "Planar body vertices must have z = 0".into(),
                ));
            }
        }

        if !self.pose.is_finite() {
            return Err(ImpasseError::InvalidBody(format!(
                "Rest pose must be finite, got {:?}",
                self.pose
            )));
        }

        if !(self.mass > 0.0) {
            return Err(ImpasseError::InvalidBody(format!(
                "Mass must be positive, got {}",
                self.mass
            )));
        }

        Ok(())
    }
}
