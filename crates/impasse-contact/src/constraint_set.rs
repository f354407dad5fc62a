//! Active contact constraints and the seam that builds them.
//!
//! A constraint is a candidate whose current distance lies below the
//! barrier activation range `dhat + dmin`. Only active constraints
//! contribute to the barrier potential.

use impasse_math::DVec3;
use impasse_types::{CandidateKind, VertexId};
use serde::{Deserialize, Serialize};

use crate::candidates::{
    Candidate, Candidates, EdgeEdgeCandidate, EdgeVertexCandidate, FaceVertexCandidate,
};
use crate::distance::{
    edge_edge_distance_squared, point_edge_distance_squared, point_triangle_distance_squared,
};

/// A primitive pair inside the barrier activation range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactConstraint {
    EdgeVertex(EdgeVertexCandidate),
    EdgeEdge(EdgeEdgeCandidate),
    FaceVertex(FaceVertexCandidate),
}

impl ContactConstraint {
    pub fn kind(&self) -> CandidateKind {
        match self {
            Self::EdgeVertex(_) => CandidateKind::EdgeVertex,
            Self::EdgeEdge(_) => CandidateKind::EdgeEdge,
            Self::FaceVertex(_) => CandidateKind::FaceVertex,
        }
    }

    /// Global vertex ids this constraint's distance depends on.
    pub fn vertex_ids(&self, edges: &[[u32; 2]], faces: &[[u32; 3]]) -> Vec<VertexId> {
        let ids: Vec<u32> = match self {
            Self::EdgeVertex(c) => {
                let [a, b] = edges[c.edge.index()];
                vec![c.vertex.0, a, b]
            }
            Self::EdgeEdge(c) => {
                let [a0, a1] = edges[c.edge0.index()];
                let [b0, b1] = edges[c.edge1.index()];
                vec![a0, a1, b0, b1]
            }
            Self::FaceVertex(c) => {
                let [a, b, f] = faces[c.face.index()];
                vec![c.vertex.0, a, b, f]
            }
        };
        ids.into_iter().map(VertexId).collect()
    }

    /// Squared distance between the two primitives at `positions`.
    pub fn distance_squared(
        &self,
        positions: &[DVec3],
        edges: &[[u32; 2]],
        faces: &[[u32; 3]],
    ) -> f64 {
        let p = |v: u32| positions[v as usize];
        match self {
            Self::EdgeVertex(c) => {
                let [a, b] = edges[c.edge.index()];
                point_edge_distance_squared(positions[c.vertex.index()], p(a), p(b))
            }
            Self::EdgeEdge(c) => {
                let [a0, a1] = edges[c.edge0.index()];
                let [b0, b1] = edges[c.edge1.index()];
                edge_edge_distance_squared(p(a0), p(a1), p(b0), p(b1))
            }
            Self::FaceVertex(c) => {
                let [a, b, f] = faces[c.face.index()];
                point_triangle_distance_squared(positions[c.vertex.index()], p(a), p(b), p(f))
            }
        }
    }
}

impl From<Candidate> for ContactConstraint {
    fn from(candidate: Candidate) -> Self {
        match candidate {
            Candidate::EdgeVertex(c) => Self::EdgeVertex(c),
            Candidate::EdgeEdge(c) => Self::EdgeEdge(c),
            Candidate::FaceVertex(c) => Self::FaceVertex(c),
        }
    }
}

/// The active constraints of one configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub constraints: Vec<ContactConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContactConstraint> {
        self.constraints.iter()
    }

    /// Number of constraints of one kind.
    pub fn count(&self, kind: CandidateKind) -> usize {
        self.constraints.iter().filter(|c| c.kind() == kind).count()
    }
}

impl FromIterator<ContactConstraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = ContactConstraint>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

/// Builds active constraint sets from candidates.
pub trait ConstraintBuilder: Send + Sync {
    /// Keeps the candidates whose distance at `world_positions` is below
    /// `dhat + dmin`.
    ///
    /// `rest_positions` is the reference configuration for builders that
    /// need one (e.g. to detect parallel edge pairs); it may equal
    /// `world_positions`.
    #[allow(clippy::too_many_arguments)]
    fn build_constraint_set(
        &self,
        candidates: &Candidates,
        rest_positions: &[DVec3],
        world_positions: &[DVec3],
        edges: &[[u32; 2]],
        faces: &[[u32; 3]],
        dhat: f64,
        dmin: f64,
    ) -> ConstraintSet;

    /// Smallest squared distance over `constraint_set`, `+∞` when empty.
    fn min_distance_squared(
        &self,
        world_positions: &[DVec3],
        edges: &[[u32; 2]],
        faces: &[[u32; 3]],
        constraint_set: &ConstraintSet,
    ) -> f64 {
        constraint_set
            .iter()
            .map(|c| c.distance_squared(world_positions, edges, faces))
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns the builder name for logging.
    fn name(&self) -> &str;
}

/// Filters candidates by closed-form primitive distances.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityConstraintBuilder;

impl ConstraintBuilder for ProximityConstraintBuilder {
    fn build_constraint_set(
        &self,
        candidates: &Candidates,
        _rest_positions: &[DVec3],
        world_positions: &[DVec3],
        edges: &[[u32; 2]],
        faces: &[[u32; 3]],
        dhat: f64,
        dmin: f64,
    ) -> ConstraintSet {
        let active = (dhat + dmin) * (dhat + dmin);
        candidates
            .iter()
            .map(ContactConstraint::from)
            .filter(|c| c.distance_squared(world_positions, edges, faces) < active)
            .collect()
    }

    fn name(&self) -> &str {
        "proximity"
    }
}
