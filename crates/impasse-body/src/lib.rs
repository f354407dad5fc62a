//! # impasse-body
//!
//! Rigid body geometry and kinematics for the Impasse contact core.
//!
//! ## Key Types
//!
//! - [`Pose`]: position plus rotation vector of one body.
//! - [`RigidBody`]: body-frame vertices, edges and faces of one body.
//! - [`RigidBodyAssembler`]: the concatenation of all bodies, with a
//!   global numbering of vertices, edges and faces.
//! - Procedural generators for test scenes (segments, squares, boxes).

pub mod assembler;
pub mod body;
pub mod generators;
pub mod pose;
pub mod topology;

pub use assembler::RigidBodyAssembler;
pub use body::RigidBody;
pub use pose::{dofs_per_body, poses_from_dofs, poses_to_dofs, Pose};
