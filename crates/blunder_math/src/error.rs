//! Validation errors raised when constructing geometric entities.

use thiserror::Error;

/// Errors that can occur while validating geometric input.
///
/// Every variant names the offending quantity so callers assembling a
/// scene can report which entity was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{what} must be finite")]
    NonFinite { what: &'static str },

    #[error("{what} must not be a zero-length vector")]
    ZeroLength { what: &'static str },

    #[error("{what} must be greater than zero (got {value})")]
    NonPositive { what: &'static str, value: f32 },

    #[error("{what} must lie in {min}..{max} (got {value})")]
    OutOfRange {
        what: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{what} coincide")]
    Coincident { what: &'static str },

    #[error("{what} is degenerate")]
    Degenerate { what: &'static str },
}

/// Result type for geometric validation.
pub type GeometryResult<T> = Result<T, GeometryError>;
