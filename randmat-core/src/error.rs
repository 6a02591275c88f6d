//! Error types for randmat operations.

use thiserror::Error;

/// Result type alias using randmat's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by distribution construction, fills, and apply routines.
///
/// All checks are local preconditions: a failing call returns before any
/// output is written.
#[derive(Error, Debug)]
pub enum Error {
    /// A distribution description is unusable: non-positive dimensions or
    /// sparsity, or a black-box family without a user buffer.
    #[error("invalid distribution: {reason}")]
    InvalidDistribution {
        /// Why the distribution was rejected
        reason: String,
    },

    /// An argument is invalid for the requested operation.
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// A leading dimension or submatrix anchor violates the operand bounds.
    #[error("dimension mismatch: {what} must be >= {need}, got {got}")]
    DimensionMismatch {
        /// The quantity that failed the bound
        what: &'static str,
        /// The minimum acceptable value
        need: i64,
        /// The value observed
        got: i64,
    },

    /// A distribution tag that this build does not know how to sample.
    #[error("unrecognized distribution '{0}'")]
    UnrecognizedDistribution(char),
}

impl Error {
    /// Create an invalid-distribution error.
    pub fn invalid_distribution(reason: impl Into<String>) -> Self {
        Self::InvalidDistribution {
            reason: reason.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a dimension-mismatch error.
    pub fn dimension_mismatch(what: &'static str, need: i64, got: i64) -> Self {
        Self::DimensionMismatch { what, need, got }
    }
}
