//! Lookup-and-run pipeline for invocations.

use std::sync::Arc;
use std::time::Instant;

use toolgate_primitives::{CallContext, Caller};
use toolgate_tools::ToolRegistry;
use tracing::{debug, warn};

use crate::{ExecutionError, ExecutionResult, Invocation};

/// Resolves invocations against a [`ToolRegistry`] and runs them.
///
/// The executor holds no mutable state and can be shared freely between
/// concurrent calls. It performs no retries and enforces no timeouts; the
/// [`CallContext`] is forwarded to the tool untouched.
#[derive(Debug, Clone)]
pub struct Executor {
    registry: Arc<ToolRegistry>,
}

impl Executor {
    /// Creates an executor bound to `registry`.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this executor resolves tools from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Executes `invocation`, measuring elapsed time from entry.
    ///
    /// Every failure (empty tool name, unknown tool, tool error) is reported
    /// inside the returned [`ExecutionResult`]; this method never panics on
    /// caller input.
    pub async fn execute(&self, ctx: &CallContext, invocation: Invocation) -> ExecutionResult {
        let start = Instant::now();
        let id = invocation.id().clone();

        if invocation.tool_name().is_empty() {
            warn!(invocation_id = %id, "invocation rejected: empty tool name");
            return ExecutionResult::new(id, Err(ExecutionError::EmptyToolName), start.elapsed());
        }

        let tool = match self.registry.get(invocation.tool_name()) {
            Ok(tool) => tool,
            Err(err) => {
                warn!(
                    invocation_id = %id,
                    tool = invocation.tool_name(),
                    error = %err,
                    "tool lookup failed"
                );
                return ExecutionResult::new(id, Err(err.into()), start.elapsed());
            }
        };

        debug!(
            invocation_id = %id,
            tool = invocation.tool_name(),
            caller = invocation.caller().map(Caller::id),
            metadata = ?invocation.metadata(),
            "executing tool"
        );

        let tool_name = invocation.tool_name().to_owned();
        let outcome = tool
            .execute(ctx, invocation.into_input())
            .await
            .map_err(ExecutionError::from);
        let duration = start.elapsed();

        match &outcome {
            Ok(_) => debug!(
                invocation_id = %id,
                tool = %tool_name,
                duration_ms = duration.as_millis(),
                "tool completed"
            ),
            Err(err) => warn!(
                invocation_id = %id,
                tool = %tool_name,
                duration_ms = duration.as_millis(),
                error = %err,
                "tool failed"
            ),
        }

        ExecutionResult::new(id, outcome, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use toolgate_tools::{Tool, ToolError, ToolResult, ToolSpec};

    struct CountingTool {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            self.name
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec::new("Counting")
        }

        async fn execute(&self, _ctx: &CallContext, input: Value) -> ToolResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.fail {
                Err(ToolError::execution("boom"))
            } else {
                Ok(input)
            }
        }
    }

    fn executor_with(tool: CountingTool) -> Executor {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(tool).unwrap();
        Executor::new(registry)
    }

    #[tokio::test]
    async fn executes_registered_tool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = executor_with(CountingTool {
            name: "echo",
            calls: Arc::clone(&calls),
            fail: false,
        });

        let result = executor
            .execute(&CallContext::new(), Invocation::new("echo", json!({ "a": 1 })))
            .await;

        assert_eq!(result.output(), Some(&json!({ "a": 1 })));
        assert!(result.error().is_none());
        assert!(result.duration() >= Duration::from_millis(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_tool_name_short_circuits_before_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = executor_with(CountingTool {
            name: "echo",
            calls: Arc::clone(&calls),
            fail: false,
        });

        let result = executor
            .execute(&CallContext::new(), Invocation::new("", Value::Null))
            .await;

        // The registry would have answered `InvalidName`.
        assert_eq!(result.error(), Some(&ExecutionError::EmptyToolName));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_tool_reports_not_found() {
        let executor = Executor::new(Arc::new(ToolRegistry::new()));
        let result = executor
            .execute(&CallContext::new(), Invocation::new("ghost", Value::Null))
            .await;

        assert_eq!(
            result.error(),
            Some(&ExecutionError::Tool(ToolError::NotFound {
                name: "ghost".into()
            }))
        );
        assert!(result.output().is_none());
        assert!(result.duration() >= Duration::ZERO);
        assert!(result.error().unwrap().to_string().contains("not found"));
    }

    #[tokio::test]
    async fn tool_error_passes_through_without_output() {
        let executor = executor_with(CountingTool {
            name: "broken",
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
        });

        let result = executor
            .execute(&CallContext::new(), Invocation::new("broken", Value::Null))
            .await;

        assert!(result.is_error());
        assert!(result.output().is_none());
        assert_eq!(result.error().unwrap().to_string(), "tool execution failed: boom");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shared_executor_runs_calls_concurrently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = Arc::new(executor_with(CountingTool {
            name: "echo",
            calls: Arc::clone(&calls),
            fail: false,
        }));

        let results = futures::future::join_all((0..16).map(|n| {
            let executor = Arc::clone(&executor);
            async move {
                executor
                    .execute(&CallContext::new(), Invocation::new("echo", json!({ "n": n })))
                    .await
            }
        }))
        .await;

        for (n, result) in results.iter().enumerate() {
            assert_eq!(result.output(), Some(&json!({ "n": n })));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn result_keeps_invocation_id() {
        let executor = Executor::new(Arc::new(ToolRegistry::new()));
        let result = executor
            .execute(
                &CallContext::new(),
                Invocation::new("ghost", Value::Null).with_id("inv-7"),
            )
            .await;
        assert_eq!(result.invocation_id().as_str(), "inv-7");
    }
}
