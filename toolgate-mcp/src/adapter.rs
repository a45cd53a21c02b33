//! Translation between MCP tool calls and the internal invocation model.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use thiserror::Error;
use toolgate_kernel::{ExecutionResult, Executor, Invocation};
use toolgate_primitives::CallContext;
use toolgate_tools::{Tool, ToolRegistry};
use tracing::{debug, info, warn};

use crate::protocol::{CallToolParams, CallToolResult, ToolDescriptor};

/// Wiring and registration failures. These are configuration errors and
/// should stop startup; runtime call failures never surface as this type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// The executor resolves tools from a different registry than the one
    /// used for discovery.
    #[error("adapter: executor is bound to a different registry")]
    RegistryMismatch,

    /// A tool reported an empty name at registration time.
    #[error("adapter: tool name is empty")]
    EmptyToolName,

    /// A tool's declared input schema cannot be encoded as a JSON Schema object.
    #[error("adapter: input schema for `{tool}` is invalid: {reason}")]
    InvalidSchema {
        /// Offending tool.
        tool: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Bridges the registry and executor to the MCP tool surface.
#[derive(Debug)]
pub struct McpAdapter {
    registry: Arc<ToolRegistry>,
    executor: Arc<Executor>,
    published: RwLock<BTreeMap<String, ToolDescriptor>>,
}

impl McpAdapter {
    /// Creates an adapter over `registry` and `executor`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::RegistryMismatch`] when `executor` was built
    /// over another registry instance.
    pub fn new(
        registry: Arc<ToolRegistry>,
        executor: Arc<Executor>,
    ) -> Result<Self, AdapterError> {
        if !Arc::ptr_eq(&registry, executor.registry()) {
            return Err(AdapterError::RegistryMismatch);
        }
        Ok(Self {
            registry,
            executor,
            published: RwLock::new(BTreeMap::new()),
        })
    }

    /// Convenience constructor building the executor from `registry`.
    #[must_use]
    pub fn from_registry(registry: Arc<ToolRegistry>) -> Self {
        let executor = Arc::new(Executor::new(Arc::clone(&registry)));
        Self {
            registry,
            executor,
            published: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registry backing discovery.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Publishes every tool currently in the registry.
    ///
    /// Each tool is published atomically; the pass stops at the first tool
    /// that fails and returns its error. Tools published before the failure
    /// stay published.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::EmptyToolName`] or
    /// [`AdapterError::InvalidSchema`] for the first offending tool.
    pub fn register_all(&self) -> Result<usize, AdapterError> {
        let tools = self.registry.list_tools();
        for tool in &tools {
            self.register_tool(tool.as_ref())?;
        }
        info!(count = tools.len(), "tools published");
        Ok(tools.len())
    }

    /// Publishes a single tool.
    ///
    /// # Errors
    ///
    /// See [`McpAdapter::register_all`].
    pub fn register_tool(&self, tool: &dyn Tool) -> Result<(), AdapterError> {
        let descriptor = describe(tool)?;
        debug!(tool = %descriptor.name, "tool published");
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Published descriptors, sorted by name.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Runs one `tools/call` request end to end.
    ///
    /// Bad arguments, unknown tools, and tool failures all come back as a
    /// [`CallToolResult`] with `is_error` set; this method has no error path.
    pub async fn call_tool(&self, ctx: &CallContext, params: CallToolParams) -> CallToolResult {
        let CallToolParams { name, arguments } = params;

        let input = match decode_arguments(arguments) {
            Ok(input) => input,
            Err(reason) => {
                warn!(tool = %name, %reason, "rejecting tool call with malformed arguments");
                return CallToolResult::failure(format!("invalid tool arguments: {reason}"));
            }
        };

        let invocation = Invocation::new(name, input);
        let result = self.executor.execute(ctx, invocation).await;
        encode_result(result)
    }
}

fn describe(tool: &dyn Tool) -> Result<ToolDescriptor, AdapterError> {
    let name = tool.name();
    if name.is_empty() {
        return Err(AdapterError::EmptyToolName);
    }

    let spec = tool.spec();
    let input_schema = spec.input_schema_or_default();
    if !input_schema.is_object() {
        return Err(AdapterError::InvalidSchema {
            tool: name.to_owned(),
            reason: format!("expected a JSON object, found {}", kind_of(&input_schema)),
        });
    }

    Ok(ToolDescriptor {
        name: name.to_owned(),
        title: non_empty(spec.title()),
        description: non_empty(spec.description()),
        input_schema,
    })
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

/// Absent or `null` arguments decode to an empty object; anything that is
/// not an object is rejected.
fn decode_arguments(arguments: Option<Value>) -> Result<Value, String> {
    match arguments {
        None | Some(Value::Null) => Ok(Value::Object(Map::new())),
        Some(value @ Value::Object(_)) => Ok(value),
        Some(other) => Err(format!("expected a JSON object, found {}", kind_of(&other))),
    }
}

fn encode_result(result: ExecutionResult) -> CallToolResult {
    let duration_ms = result.duration().as_millis();
    let id = result.invocation_id().clone();
    match result.into_outcome() {
        Ok(output) => {
            debug!(invocation_id = %id, duration_ms, "tool call succeeded");
            let text = render_text(&output);
            let structured = match output {
                Value::Object(map) => Some(map),
                _ => None,
            };
            CallToolResult::success(text, structured)
        }
        Err(err) => {
            debug!(invocation_id = %id, duration_ms, error = %err, "tool call failed");
            CallToolResult::failure(err.to_string())
        }
    }
}

/// Text rendering of a tool output: strings verbatim, everything else as
/// compact JSON, falling back to the debug form if encoding fails.
fn render_text(output: &Value) -> String {
    match output {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use toolgate_tools::{FnTool, ToolError, ToolSpec};

    fn registry_with(tools: Vec<Arc<dyn Tool>>) -> Arc<ToolRegistry> {
        let registry = Arc::new(ToolRegistry::new());
        for tool in tools {
            registry.add(tool).unwrap();
        }
        registry
    }

    fn tool(name: &str, spec: ToolSpec, output: ToolResultFixture) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(name, spec, move |_ctx: CallContext, input: Value| {
            let output = output.clone();
            async move {
                match output {
                    ToolResultFixture::Echo => Ok(input),
                    ToolResultFixture::Value(value) => Ok(value),
                    ToolResultFixture::Fail(reason) => Err(ToolError::execution(reason)),
                }
            }
        }))
    }

    #[derive(Clone)]
    enum ToolResultFixture {
        Echo,
        Value(Value),
        Fail(&'static str),
    }

    #[test]
    fn mismatched_registry_is_rejected() {
        let executor = Arc::new(Executor::new(Arc::new(ToolRegistry::new())));
        let err = McpAdapter::new(Arc::new(ToolRegistry::new()), executor).unwrap_err();
        assert_eq!(err, AdapterError::RegistryMismatch);
    }

    #[test]
    fn missing_schema_is_published_as_object() {
        let registry = registry_with(vec![tool(
            "plain",
            ToolSpec::new("Plain"),
            ToolResultFixture::Echo,
        )]);
        let adapter = McpAdapter::from_registry(registry);

        assert_eq!(adapter.register_all().unwrap(), 1);
        let tools = adapter.list_tools();
        assert_eq!(tools[0].input_schema, json!({ "type": "object" }));
        assert_eq!(tools[0].title.as_deref(), Some("Plain"));
        assert!(tools[0].description.is_none());
    }

    #[test]
    fn non_object_schema_aborts_registration() {
        let registry = registry_with(vec![tool(
            "bad",
            ToolSpec::new("Bad").with_input_schema(json!(["not", "a", "schema"])),
            ToolResultFixture::Echo,
        )]);
        let adapter = McpAdapter::from_registry(registry);

        let err = adapter.register_all().unwrap_err();
        assert!(matches!(err, AdapterError::InvalidSchema { ref tool, .. } if tool == "bad"));
        assert!(adapter.list_tools().is_empty());
    }

    #[test]
    fn decode_arguments_rules() {
        assert_eq!(decode_arguments(None).unwrap(), json!({}));
        assert_eq!(decode_arguments(Some(Value::Null)).unwrap(), json!({}));
        assert_eq!(decode_arguments(Some(json!({ "k": 1 }))).unwrap(), json!({ "k": 1 }));
        let err = decode_arguments(Some(json!([1, 2]))).unwrap_err();
        assert!(err.contains("array"));
    }

    #[tokio::test]
    async fn absent_arguments_reach_tool_as_empty_object() {
        let registry = registry_with(vec![tool(
            "echo",
            ToolSpec::new("Echo"),
            ToolResultFixture::Echo,
        )]);
        let adapter = McpAdapter::from_registry(registry);

        let result = adapter
            .call_tool(&CallContext::new(), CallToolParams::new("echo", None))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.text(), "{}");
        assert_eq!(result.structured_content, Some(Map::new()));
    }

    #[tokio::test]
    async fn malformed_arguments_become_tool_failure() {
        let registry = registry_with(vec![tool(
            "echo",
            ToolSpec::new("Echo"),
            ToolResultFixture::Echo,
        )]);
        let adapter = McpAdapter::from_registry(registry);

        let result = adapter
            .call_tool(&CallContext::new(), CallToolParams::new("echo", Some(json!("oops"))))
            .await;
        assert!(result.is_error);
        assert!(result.text().starts_with("invalid tool arguments"));
    }

    #[tokio::test]
    async fn object_output_is_structured_and_rendered() {
        let registry = registry_with(vec![tool(
            "obj",
            ToolSpec::new("Obj"),
            ToolResultFixture::Value(json!({ "a": 1 })),
        )]);
        let adapter = McpAdapter::from_registry(registry);

        let result = adapter
            .call_tool(&CallContext::new(), CallToolParams::new("obj", None))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.text(), r#"{"a":1}"#);
        assert_eq!(
            result.structured_content.map(Value::Object),
            Some(json!({ "a": 1 }))
        );
    }

    #[tokio::test]
    async fn string_output_is_verbatim() {
        let registry = registry_with(vec![tool(
            "greet",
            ToolSpec::new("Greet"),
            ToolResultFixture::Value(json!("hello there")),
        )]);
        let adapter = McpAdapter::from_registry(registry);

        let result = adapter
            .call_tool(&CallContext::new(), CallToolParams::new("greet", None))
            .await;
        assert_eq!(result.text(), "hello there");
        assert!(result.structured_content.is_none());
    }

    #[tokio::test]
    async fn tool_failure_becomes_error_result() {
        let registry = registry_with(vec![tool(
            "broken",
            ToolSpec::new("Broken"),
            ToolResultFixture::Fail("disk on fire"),
        )]);
        let adapter = McpAdapter::from_registry(registry);

        let result = adapter
            .call_tool(&CallContext::new(), CallToolParams::new("broken", None))
            .await;
        assert!(result.is_error);
        assert_eq!(result.text(), "tool execution failed: disk on fire");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result() {
        let adapter = McpAdapter::from_registry(Arc::new(ToolRegistry::new()));
        let result = adapter
            .call_tool(&CallContext::new(), CallToolParams::new("ghost", None))
            .await;
        assert!(result.is_error);
        assert!(result.text().contains("not found"));
    }

    #[test]
    fn only_the_empty_name_is_refused_at_registration() {
        let adapter = McpAdapter::from_registry(Arc::new(ToolRegistry::new()));
        let unnamed = tool("", ToolSpec::new("Unnamed"), ToolResultFixture::Echo);
        assert_eq!(
            adapter.register_tool(unnamed.as_ref()),
            Err(AdapterError::EmptyToolName)
        );

        let spaced = tool(" ", ToolSpec::new("Spaced"), ToolResultFixture::Echo);
        adapter.register_tool(spaced.as_ref()).unwrap();
        assert_eq!(adapter.list_tools()[0].name, " ");
    }

    #[test]
    fn render_text_variants() {
        assert_eq!(render_text(&Value::Null), "");
        assert_eq!(render_text(&json!(42)), "42");
        assert_eq!(render_text(&json!([1, "x"])), r#"[1,"x"]"#);
    }
}
