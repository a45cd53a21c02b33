//! Shared error definitions for toolgate primitives.

use thiserror::Error;

/// Result alias used by the primitive constructors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building primitive values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A metadata entry failed validation.
    #[error("invalid metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The caller principal failed validation.
    #[error("invalid caller: {reason}")]
    InvalidCaller {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
