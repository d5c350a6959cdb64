//! Error types for the projection crate.

use thiserror::Error;

/// Errors raised by projection construction and coordinate transforms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Bad construction parameters (malformed ellipsoid, degenerate
    /// standard parallels, etc).
    #[error("invalid projection argument: {0}")]
    InvalidArgument(String),

    /// `project`/`unproject` received a non-finite input, an input outside
    /// `[-180, 180] x [-90, 90]`, or produced a non-finite intermediate
    /// value (e.g. log of a non-positive number).
    #[error("projection domain error: {0}")]
    DomainError(String),
}
