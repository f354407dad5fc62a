//! Collision candidates: primitive pairs that may come into contact.
//!
//! Candidates carry global ids only. Geometry is always looked up
//! through the [`RigidBodyAssembler`](impasse_body::RigidBodyAssembler)
//! and the poses of the query.

use impasse_types::{CandidateKind, EdgeId, FaceId, VertexId};
use serde::{Deserialize, Serialize};

/// A vertex against an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeVertexCandidate {
    pub edge: EdgeId,
    pub vertex: VertexId,
}

/// An edge against an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeEdgeCandidate {
    pub edge0: EdgeId,
    pub edge1: EdgeId,
}

/// A vertex against a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceVertexCandidate {
    pub face: FaceId,
    pub vertex: VertexId,
}

impl EdgeVertexCandidate {
    pub fn new(edge: u32, vertex: u32) -> Self {
        Self {
            edge: EdgeId(edge),
            vertex: VertexId(vertex),
        }
    }
}

impl EdgeEdgeCandidate {
    pub fn new(edge0: u32, edge1: u32) -> Self {
        Self {
            edge0: EdgeId(edge0),
            edge1: EdgeId(edge1),
        }
    }
}

impl FaceVertexCandidate {
    pub fn new(face: u32, vertex: u32) -> Self {
        Self {
            face: FaceId(face),
            vertex: VertexId(vertex),
        }
    }
}

/// Any one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Candidate {
    EdgeVertex(EdgeVertexCandidate),
    EdgeEdge(EdgeEdgeCandidate),
    FaceVertex(FaceVertexCandidate),
}

impl Candidate {
    pub fn kind(&self) -> CandidateKind {
        match self {
            Self::EdgeVertex(_) => CandidateKind::EdgeVertex,
            Self::EdgeEdge(_) => CandidateKind::EdgeEdge,
            Self::FaceVertex(_) => CandidateKind::FaceVertex,
        }
    }
}

/// Candidates grouped by kind.
///
/// The flat index space used for parallel work runs over edge-vertex,
/// then edge-edge, then face-vertex candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidates {
    pub ev: Vec<EdgeVertexCandidate>,
    pub ee: Vec<EdgeEdgeCandidate>,
    pub fv: Vec<FaceVertexCandidate>,
}

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of candidates of all kinds.
    pub fn len(&self) -> usize {
        self.ev.len() + self.ee.len() + self.fv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidate at flat index `i`.
    pub fn get(&self, i: usize) -> Option<Candidate> {
        let (num_ev, num_ee) = (self.ev.len(), self.ee.len());
        if i < num_ev {
            Some(Candidate::EdgeVertex(self.ev[i]))
        } else if i - num_ev < num_ee {
            Some(Candidate::EdgeEdge(self.ee[i - num_ev]))
        } else {
            self.fv.get(i - num_ev - num_ee).copied().map(Candidate::FaceVertex)
        }
    }

    /// Iterates in flat index order.
    pub fn iter(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.ev
            .iter()
            .copied()
            .map(Candidate::EdgeVertex)
            .chain(self.ee.iter().copied().map(Candidate::EdgeEdge))
            .chain(self.fv.iter().copied().map(Candidate::FaceVertex))
    }

    pub fn push(&mut self, candidate: Candidate) {
        match candidate {
            Candidate::EdgeVertex(c) => self.ev.push(c),
            Candidate::EdgeEdge(c) => self.ee.push(c),
            Candidate::FaceVertex(c) => self.fv.push(c),
        }
    }

    /// Sorts each group and removes duplicates.
    pub fn sort_and_dedup(&mut self) {
        self.ev.sort_unstable();
        self.ev.dedup();
        self.ee.sort_unstable();
        self.ee.dedup();
        self.fv.sort_unstable();
        self.fv.dedup();
    }
}

impl FromIterator<Candidate> for Candidates {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut out = Self::new();
        iter.into_iter().for_each(|c| out.push(c));
        out
    }
}

/// Which candidate kinds a detection pass generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionKinds {
    pub edge_vertex: bool,
    pub edge_edge: bool,
    pub face_vertex: bool,
}

impl CollisionKinds {
    /// Planar scenes only need vertex-edge pairs; volumetric scenes need
    /// edge-edge and vertex-face pairs.
    pub fn for_dim(dim: usize) -> Self {
        if dim == 2 {
            Self {
                edge_vertex: true,
                edge_edge: false,
                face_vertex: false,
            }
        } else {
            Self {
                edge_vertex: false,
                edge_edge: true,
                face_vertex: true,
            }
        }
    }

    pub fn contains(&self, kind: CandidateKind) -> bool {
        match kind {
            CandidateKind::EdgeVertex => self.edge_vertex,
            CandidateKind::EdgeEdge => self.edge_edge,
            CandidateKind::FaceVertex => self.face_vertex,
        }
    }
}
