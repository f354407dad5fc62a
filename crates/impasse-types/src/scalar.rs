//! Scalar type alias for the contact core.
//!
//! Barrier potentials diverge near zero separation, so everything
//! here runs in double precision.

/// The floating-point type used throughout the contact core.
pub type Scalar = f64;
