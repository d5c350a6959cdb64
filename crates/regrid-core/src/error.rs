//! Error types for the regridding engine.

use thiserror::Error;

/// Errors raised by grid construction and regrid calls.
///
/// Constructors return this sum type and release any partially-acquired
/// resources before returning; per-point failures in the regrid hot loop
/// never surface here, they are silently dropped by the validity filter
/// instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegridError {
    /// Out-of-range geometry, non-finite inputs, incoherent dimensions.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A projection or vertical transform produced a non-finite intermediate.
    #[error("domain error: {0}")]
    DomainError(String),

    /// Allocation failed.
    #[error("resource error: {0}")]
    ResourceError(String),

    /// Subset indices outside the parent grid, or a level/layer count
    /// mismatch.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl From<projection::ProjectionError> for RegridError {
    fn from(err: projection::ProjectionError) -> Self {
        match err {
            projection::ProjectionError::InvalidArgument(msg) => RegridError::InvalidArgument(msg),
            projection::ProjectionError::DomainError(msg) => RegridError::DomainError(msg),
        }
    }
}

/// Result type for regridding engine operations.
pub type Result<T> = std::result::Result<T, RegridError>;
