//! Error types for mixture model fitting.

use thiserror::Error;

/// Errors surfaced by model construction, fitting, and queries.
#[derive(Error, Debug)]
pub enum MixtureError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("numeric degeneracy: {reason}")]
    NumericDegeneracy { reason: String },

    #[error("model has no data bound. Call fit() or set_data() first")]
    NotFitted,
}

/// Result type for mixture model operations.
pub type MixtureResult<T> = Result<T, MixtureError>;
