//! Protocol-agnostic representation of one tool call.

use chrono::{DateTime, Utc};
use serde_json::Value;
use toolgate_primitives::{Caller, InvocationId, Metadata};

/// A single request to run a named tool with a given input.
///
/// Invocations are built per call at the protocol boundary, consumed once by
/// the [`Executor`](crate::Executor), and then dropped. They never carry wire
/// protocol types.
#[derive(Debug, Clone)]
pub struct Invocation {
    id: InvocationId,
    tool_name: String,
    input: Value,
    caller: Option<Caller>,
    metadata: Metadata,
    start_time: DateTime<Utc>,
}

impl Invocation {
    /// Creates an invocation with a generated id, stamped with the current time.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            id: InvocationId::generate(),
            tool_name: tool_name.into(),
            input,
            caller: None,
            metadata: Metadata::new(),
            start_time: Utc::now(),
        }
    }

    /// Overrides the generated id with a caller-assigned one.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<InvocationId>) -> Self {
        self.id = id.into();
        self
    }

    /// Attaches the calling principal.
    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Attaches log-safe metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Overrides the caller-side start timestamp.
    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Invocation identifier.
    #[must_use]
    pub fn id(&self) -> &InvocationId {
        &self.id
    }

    /// Name of the tool to run.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Structured input handed to the tool.
    #[must_use]
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// Calling principal, if known.
    #[must_use]
    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    /// Log-safe metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Time the caller created the invocation.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Consumes the invocation, returning its input.
    #[must_use]
    pub fn into_input(self) -> Value {
        self.input
    }
}
