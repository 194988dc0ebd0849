//! Error types for the otoro core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::fmt;

use thiserror::Error;

/// Stable codes describing [`MTreeError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum MTreeErrorCode {
    /// Minimum node capacity must be at least two.
    InvalidMinCapacity,
    /// Maximum node capacity must exceed the minimum.
    InvalidMaxCapacity,
}

impl MTreeErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidMinCapacity => "OTORO_INVALID_MIN_CAPACITY",
            Self::InvalidMaxCapacity => "OTORO_INVALID_MAX_CAPACITY",
        }
    }
}

impl fmt::Display for MTreeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type produced when constructing an [`crate::MTree`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MTreeError {
    /// Minimum node capacity must be at least two.
    #[error("min_node_capacity must be at least 2 (got {got})")]
    InvalidMinCapacity { got: usize },
    /// Maximum node capacity must exceed the minimum.
    #[error("max_node_capacity ({max}) must be greater than min_node_capacity ({min})")]
    InvalidMaxCapacity { min: usize, max: usize },
}

impl MTreeError {
    /// Retrieve the stable [`MTreeErrorCode`] for this error.
    pub const fn code(&self) -> MTreeErrorCode {
        match self {
            Self::InvalidMinCapacity { .. } => MTreeErrorCode::InvalidMinCapacity,
            Self::InvalidMaxCapacity { .. } => MTreeErrorCode::InvalidMaxCapacity,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, MTreeError>;
