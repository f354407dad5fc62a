//! Strongly-typed identifiers for bodies and collision primitives.
//!
//! Vertex, edge, and face ids are *global*: they index into the
//! concatenation of every body's primitives, as numbered by the
//! rigid body assembler. Newtypes keep edge ids from being passed
//! where a vertex id is expected.

use serde::{Deserialize, Serialize};

/// Index of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Global vertex index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Global edge index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// Global face (triangle) index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u32);

macro_rules! impl_index {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Returns the raw index as `usize` for array indexing.
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl From<u32> for $ty {
                fn from(val: u32) -> Self {
                    Self(val)
                }
            }
        )*
    };
}

impl_index!(BodyId, VertexId, EdgeId, FaceId);

/// Kind of primitive pair a candidate or constraint refers to.
///
/// The declaration order is also the flattening order used when the
/// three kinds are iterated as one index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    /// Vertex against edge.
    #[serde(rename = "ev")]
    EdgeVertex,
    /// Edge against edge.
    #[serde(rename = "ee")]
    EdgeEdge,
    /// Vertex against triangle.
    #[serde(rename = "fv")]
    FaceVertex,
}

impl CandidateKind {
    /// Human-readable label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::EdgeVertex => "Edge-vertex",
            Self::EdgeEdge => "Edge-edge",
            Self::FaceVertex => "Face-vertex",
        }
    }
}
