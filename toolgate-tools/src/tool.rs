//! The tool capability contract and its discovery metadata.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use toolgate_primitives::CallContext;

use crate::ToolResult;

/// Schema advertised for tools that declare none: "accepts an object".
#[must_use]
pub fn default_input_schema() -> Value {
    json!({ "type": "object" })
}

/// Declarative description of a tool used for discovery.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<Value>,
}

impl ToolSpec {
    /// Creates a spec with the given title and no description or schema.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the JSON-Schema-like description of accepted arguments.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared input schema, if any.
    #[must_use]
    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    /// Declared input schema, or [`default_input_schema`] when none was given.
    #[must_use]
    pub fn input_schema_or_default(&self) -> Value {
        self.input_schema
            .clone()
            .unwrap_or_else(default_input_schema)
    }
}

/// A named capability exposed to remote callers.
///
/// Identity is stable: [`Tool::name`] must return the same non-empty value
/// for the lifetime of the tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier used for registry keys and wire calls.
    fn name(&self) -> &str;

    /// Discovery metadata.
    fn spec(&self) -> ToolSpec;

    /// Runs the tool. `ctx` carries the caller's cancellation signal and
    /// deadline and must be honoured by long-running implementations.
    async fn execute(&self, ctx: &CallContext, input: Value) -> ToolResult<Value>;
}

/// Tool backed by an async closure.
pub struct FnTool<F> {
    name: String,
    spec: ToolSpec,
    handler: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(CallContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    /// Wraps `handler` as a tool named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, spec: ToolSpec, handler: F) -> Self {
        Self {
            name: name.into(),
            spec,
            handler,
        }
    }
}

impl<F> fmt::Debug for FnTool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(CallContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    async fn execute(&self, ctx: &CallContext, input: Value) -> ToolResult<Value> {
        (self.handler)(ctx.clone(), input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolError;

    #[test]
    fn missing_schema_defaults_to_object() {
        let spec = ToolSpec::new("Echo");
        assert!(spec.input_schema().is_none());
        assert_eq!(spec.input_schema_or_default(), json!({ "type": "object" }));
    }

    #[test]
    fn declared_schema_is_kept() {
        let schema = json!({
            "type": "object",
            "properties": { "msg": { "type": "string" } },
            "required": ["msg"],
        });
        let spec = ToolSpec::new("Echo")
            .with_description("Echo a message")
            .with_input_schema(schema.clone());

        assert_eq!(spec.description(), "Echo a message");
        assert_eq!(spec.input_schema_or_default(), schema);
    }

    #[tokio::test]
    async fn fn_tool_invokes_closure() {
        let tool = FnTool::new(
            "echo",
            ToolSpec::new("Echo"),
            |_ctx: CallContext, input: Value| async move { Ok(input) },
        );

        let payload = json!({ "msg": "hi" });
        let output = tool.execute(&CallContext::new(), payload.clone()).await.unwrap();
        assert_eq!(tool.name(), "echo");
        assert_eq!(output, payload);
    }

    #[tokio::test]
    async fn fn_tool_sees_cancellation() {
        let tool = FnTool::new(
            "wait",
            ToolSpec::new("Wait"),
            |ctx: CallContext, _input: Value| async move {
                ctx.done().await;
                Err::<Value, _>(ToolError::Cancelled)
            },
        );

        let ctx = CallContext::new();
        ctx.cancellation().cancel();
        let err = tool.execute(&ctx, Value::Null).await.unwrap_err();
        assert_eq!(err, ToolError::Cancelled);
    }
}
