//! Exact continuous collision detection seam.
//!
//! Root finding for the time of impact of a primitive pair moving
//! under rigid motion is supplied by the embedding application through
//! [`ExactCcd`]. The contact core only orchestrates the queries.

use impasse_body::{Pose, RigidBodyAssembler};
use serde::{Deserialize, Serialize};

use crate::candidates::{Candidate, EdgeEdgeCandidate, EdgeVertexCandidate, FaceVertexCandidate};

/// How body motion between the two poses is interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryType {
    /// World vertices move on straight lines.
    Linear,
    /// Rigid motion approximated by a piecewise-linear path.
    PiecewiseLinear,
    /// Exact rigid motion (interpolated pose).
    #[default]
    Rigid,
}

impl TrajectoryType {
    /// Trajectory used when only the existence of a collision matters.
    ///
    /// Piecewise-linear paths can miss impacts the rigid path has, so
    /// existence queries use the rigid path instead.
    pub fn for_existence_query(self) -> Self {
        match self {
            Self::PiecewiseLinear => Self::Rigid,
            other => other,
        }
    }
}

/// Everything a CCD query needs besides the candidate.
#[derive(Debug, Clone, Copy)]
pub struct CcdQuery<'a> {
    pub bodies: &'a RigidBodyAssembler,
    pub poses_t0: &'a [Pose],
    pub poses_t1: &'a [Pose],
    pub trajectory: TrajectoryType,
    /// Best time of impact known so far. Implementations may use it to
    /// stop refining early, but whether they report a collision must not
    /// depend on it.
    pub earliest_toi: f64,
    /// Separation at which primitives count as touching.
    pub minimum_separation: f64,
}

/// Exact time-of-impact root finder.
///
/// Each method returns `Some(toi)` with `toi ∈ [0, 1]` when the pair
/// collides during the step, `None` otherwise.
pub trait ExactCcd: Send + Sync {
    fn edge_vertex_ccd(&self, query: &CcdQuery<'_>, candidate: &EdgeVertexCandidate) -> Option<f64>;

    fn edge_edge_ccd(&self, query: &CcdQuery<'_>, candidate: &EdgeEdgeCandidate) -> Option<f64>;

    fn face_vertex_ccd(&self, query: &CcdQuery<'_>, candidate: &FaceVertexCandidate) -> Option<f64>;

    /// Dispatches on the candidate kind.
    fn ccd(&self, query: &CcdQuery<'_>, candidate: &Candidate) -> Option<f64> {
        match candidate {
            Candidate::EdgeVertex(c) => self.edge_vertex_ccd(query, c),
            Candidate::EdgeEdge(c) => self.edge_edge_ccd(query, c),
            Candidate::FaceVertex(c) => self.face_vertex_ccd(query, c),
        }
    }

    /// Returns the implementation name for logging.
    fn name(&self) -> &str;
}
