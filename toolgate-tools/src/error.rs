//! Errors produced by tool registration, lookup, and execution.

use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced by tool registration, lookup, and execution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// The tool cannot be registered as supplied.
    #[error("invalid tool: {reason}")]
    InvalidTool {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateName {
        /// Name of the offending tool.
        name: String,
    },

    /// Lookup was attempted with an empty name.
    #[error("tool name is empty")]
    InvalidName,

    /// Requested tool does not exist.
    #[error("tool `{name}` not found")]
    NotFound {
        /// Name of the missing tool.
        name: String,
    },

    /// The tool rejected its input.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },

    /// The tool stopped because its call was cancelled or ran out of time.
    #[error("tool call cancelled")]
    Cancelled,
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates an input validation error from the supplied reason.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Returns `true` for lookup failures (`InvalidName`, `NotFound`).
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::InvalidName | Self::NotFound { .. })
    }
}
