//! Concurrent name → tool directory.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::{Tool, ToolError, ToolResult};

/// Registry that stores tool implementations keyed by their stable name.
///
/// Reads take a shared lock and writes an exclusive one, so concurrent
/// lookups never serialize against each other and never observe a partially
/// inserted entry. Listings are snapshots in unspecified order.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.list_names();
        f.debug_struct("ToolRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section below leaves the map consistent, so a lock
    // poisoned by a panicking holder is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn Tool>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn Tool>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a shared tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidTool`] if the tool's name is empty and
    /// [`ToolError::DuplicateName`] if the name is already present. The
    /// registry is left untouched in both cases.
    pub fn add(&self, tool: Arc<dyn Tool>) -> ToolResult<()> {
        let name = tool.name().to_owned();
        if name.is_empty() {
            return Err(ToolError::InvalidTool {
                reason: "tool name cannot be empty".into(),
            });
        }

        let mut inner = self.write();
        if inner.contains_key(&name) {
            return Err(ToolError::DuplicateName { name });
        }
        debug!(tool = %name, "tool registered");
        inner.insert(name, tool);
        Ok(())
    }

    /// Registers an owned tool implementation.
    ///
    /// # Errors
    ///
    /// See [`ToolRegistry::add`].
    pub fn register<T>(&self, tool: T) -> ToolResult<()>
    where
        T: Tool + 'static,
    {
        self.add(Arc::new(tool))
    }

    /// Returns the tool registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidName`] for an empty name and
    /// [`ToolError::NotFound`] when nothing is registered under it.
    pub fn get(&self, name: &str) -> ToolResult<Arc<dyn Tool>> {
        if name.is_empty() {
            return Err(ToolError::InvalidName);
        }
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound {
                name: name.to_owned(),
            })
    }

    /// Removes and returns the tool registered under `name`.
    ///
    /// # Errors
    ///
    /// Same as [`ToolRegistry::get`].
    pub fn remove(&self, name: &str) -> ToolResult<Arc<dyn Tool>> {
        if name.is_empty() {
            return Err(ToolError::InvalidName);
        }
        let removed = self.write().remove(name);
        removed.ok_or_else(|| ToolError::NotFound {
            name: name.to_owned(),
        })
    }

    /// Returns `true` if a tool is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Snapshot of all registered names.
    #[must_use]
    pub fn list_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Snapshot of all registered tools.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.read().values().cloned().collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};
    use toolgate_primitives::CallContext;

    use crate::{FnTool, ToolSpec};

    fn echo(name: &str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            name,
            ToolSpec::new("Echo").with_description("Echo incoming payload"),
            |_ctx: CallContext, input: Value| async move { Ok(input) },
        ))
    }

    #[tokio::test]
    async fn add_and_get_tool() {
        let registry = ToolRegistry::new();
        registry.add(echo("echo")).unwrap();

        let tool = registry.get("echo").unwrap();
        let payload = json!({ "message": "hello" });
        let output = tool.execute(&CallContext::new(), payload.clone()).await.unwrap();
        assert_eq!(output, payload);
    }

    #[test]
    fn distinct_names_register() {
        let registry = ToolRegistry::new();
        registry.add(echo("a")).unwrap();
        registry.add(echo("b")).unwrap();

        let mut names = registry.list_names();
        names.sort();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(registry.list_tools().len(), 2);
    }

    #[test]
    fn duplicate_registration_errors() {
        let registry = ToolRegistry::new();
        registry.add(echo("echo")).unwrap();

        let err = registry
            .add(echo("echo"))
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, ToolError::DuplicateName { ref name } if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_name_is_invalid_tool() {
        let registry = ToolRegistry::new();
        let err = registry.add(echo("")).expect_err("empty name should fail");
        assert!(matches!(err, ToolError::InvalidTool { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn only_the_empty_name_is_rejected() {
        let registry = ToolRegistry::new();
        registry.add(echo(" ")).unwrap();

        assert_eq!(registry.get(" ").unwrap().name(), " ");
        assert_eq!(registry.get("").err(), Some(ToolError::InvalidName));
        assert!(matches!(
            registry.get("  "),
            Err(ToolError::NotFound { ref name }) if name == "  "
        ));
    }

    #[test]
    fn lookup_errors() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.get("").err(), Some(ToolError::InvalidName));
        assert_eq!(
            registry.get("missing").err(),
            Some(ToolError::NotFound {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn remove_drops_entry() {
        let registry = ToolRegistry::new();
        registry.add(echo("echo")).unwrap();

        let removed = registry.remove("echo").unwrap();
        assert_eq!(removed.name(), "echo");
        assert!(!registry.contains("echo"));
        assert!(matches!(
            registry.remove("echo"),
            Err(ToolError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_all_visible() {
        let registry = Arc::new(ToolRegistry::new());
        let names: Vec<String> = (0..64).map(|i| format!("tool-{i}")).collect();

        let adds = names.iter().cloned().map(|name| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.add(echo(&name)) })
        });
        for result in futures::future::join_all(adds).await {
            result.unwrap().unwrap();
        }

        let gets = names.iter().cloned().map(|name| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get(&name).map(|t| t.name().to_owned()) })
        });
        let resolved: Vec<String> = futures::future::join_all(gets)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(resolved, names);
        assert_eq!(registry.len(), names.len());
    }
}
