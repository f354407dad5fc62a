//! # impasse-types
//!
//! Shared types, identifiers, error types, and constants
//! for the Impasse contact-barrier core.
//!
//! This crate has zero domain logic. It defines the vocabulary
//! that all other Impasse crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{ImpasseError, ImpasseResult};
pub use ids::{BodyId, CandidateKind, EdgeId, FaceId, VertexId};
pub use scalar::Scalar;
