//! # impasse-math
//!
//! Linear algebra primitives for the Impasse contact core.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec3`, `DQuat`, etc.)
//! - Sparse matrix representation (CSR) and Cholesky solver interface
//! - Row-major dense matrix for constraint jacobians
//! - Central finite differences for derivative checks

pub mod dense;
pub mod faer_solver;
pub mod finite_diff;
pub mod sparse;

// Re-export glam types as the canonical math types for Impasse.
pub use glam::{DMat3, DQuat, DVec2, DVec3};
