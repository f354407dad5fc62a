//! Numerical constants and configuration defaults.

/// Default initial barrier activation distance d̂.
pub const DEFAULT_BARRIER_ACTIVATION_DISTANCE: f64 = 1.0e-3;

/// Default minimum separation distance d_min.
pub const DEFAULT_MINIMUM_SEPARATION: f64 = 0.0;

/// Default barrier stiffness κ.
pub const DEFAULT_BARRIER_STIFFNESS: f64 = 1.0;

/// Default Newton termination threshold on the gradient norm.
pub const DEFAULT_TERMINATION_THRESHOLD: f64 = 1.0e-6;

/// Default step for central finite differences.
pub const DEFAULT_FINITE_DIFFERENCE_STEP: f64 = 1.0e-7;

/// Value used for "no upper bound" in box constraints.
pub const NO_UPPER_BOUND: f64 = 2.0e19;

/// Value used for "no lower bound" in box constraints.
pub const NO_LOWER_BOUND: f64 = -2.0e19;

/// Epsilon for degenerate geometry (zero-length edges, zero-area faces).
pub const DEGENERATE_EPSILON: f64 = 1.0e-20;
