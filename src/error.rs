//! Error types for the Galvani circuit core.
//!
//! The only error surfaced to callers is [`GalvaniError::InvalidElement`],
//! raised when an element is constructed with impossible terminals or
//! parameters. Numerical failures during a solve are deliberately *not*
//! errors at the public boundary: the interactive loop must keep running, so
//! a singular system degrades into an all-zero solution and is reported on
//! the `log` channel instead.

use thiserror::Error;

/// Result type alias using [`GalvaniError`].
pub type Result<T> = std::result::Result<T, GalvaniError>;

/// Unified error type for all Galvani operations.
#[derive(Error, Debug)]
pub enum GalvaniError {
    /// An element was constructed with invalid terminals or parameters.
    /// This is a programmer error, never produced by normal editing.
    #[error("Invalid {kind}: {message}")]
    InvalidElement { kind: &'static str, message: String },

    /// The assembled linear system could not be solved (rank-deficient or
    /// numerically degenerate). Internal: callers of the public solve entry
    /// points receive the all-zero fallback solution instead.
    #[error("Singular system: {message}")]
    SingularSystem { message: String },
}

impl GalvaniError {
    /// Create an invalid-element error.
    pub fn invalid_element(kind: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidElement {
            kind,
            message: message.into(),
        }
    }

    /// Create a singular-system error.
    pub fn singular(message: impl Into<String>) -> Self {
        Self::SingularSystem {
            message: message.into(),
        }
    }
}
