//! Error types for the Impasse contact core.
//!
//! All crates return `ImpasseResult<T>` from fallible operations.
//! Degenerate barrier inputs and zero time-of-impact anomalies are
//! not errors; they have defined values or are logged.

use thiserror::Error;

/// Unified error type for the Impasse contact core.
#[derive(Debug, Error)]
pub enum ImpasseError {
    /// A problem or solver does not provide an optional capability.
    #[error("Unimplemented capability: {0}")]
    Unimplemented(&'static str),

    /// Rigid body data is malformed or inconsistent.
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two quantities that must agree in size do not.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Sparse factorization or solve failed.
    #[error("Factorization failed: {0}")]
    Factorization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ImpasseError {
    /// Returns true if this error only reports a missing capability.
    ///
    /// Callers use this to substitute a fallback (e.g. finite differences)
    /// instead of aborting.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented(_))
    }
}

/// Convenience alias for `Result<T, ImpasseError>`.
pub type ImpasseResult<T> = Result<T, ImpasseError>;
