//! Outcome of executing an invocation.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use toolgate_primitives::InvocationId;
use toolgate_tools::ToolError;

/// Failures reported by the executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The invocation did not name a tool.
    #[error("invocation tool name is empty")]
    EmptyToolName,

    /// Lookup failed or the tool itself reported an error.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Output or error of one invocation plus executor-measured wall time.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    invocation_id: InvocationId,
    outcome: Result<Value, ExecutionError>,
    duration: Duration,
}

impl ExecutionResult {
    pub(crate) fn new(
        invocation_id: InvocationId,
        outcome: Result<Value, ExecutionError>,
        duration: Duration,
    ) -> Self {
        Self {
            invocation_id,
            outcome,
            duration,
        }
    }

    /// Identifier of the invocation this result belongs to.
    #[must_use]
    pub fn invocation_id(&self) -> &InvocationId {
        &self.invocation_id
    }

    /// Tool output, when the call succeeded.
    #[must_use]
    pub fn output(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    /// Failure, when the call did not succeed.
    #[must_use]
    pub fn error(&self) -> Option<&ExecutionError> {
        self.outcome.as_ref().err()
    }

    /// Returns `true` if the result carries an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Elapsed time observed by the executor.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Consumes the result, returning the output or error.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecutionError`] the call ended with.
    pub fn into_outcome(self) -> Result<Value, ExecutionError> {
        self.outcome
    }
}
