//! Capability dispatch core facade.
//!
//! Depend on this crate via `cargo add toolgate`. It bundles the internal
//! crates behind feature flags so that an embedder that only needs the
//! registry and executor does not pull in the MCP server.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use toolgate_primitives as primitives;

/// Tool trait and registry.
pub use toolgate_tools as tools;

/// Invocation executor (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use toolgate_kernel as kernel;

/// MCP adapter and server (enabled by `mcp` feature).
#[cfg(feature = "mcp")]
pub use toolgate_mcp as mcp;

/// Server configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use toolgate_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use toolgate_telemetry as telemetry;

/// The types most tool authors need.
pub mod prelude {
    pub use toolgate_primitives::{CallContext, CancellationToken};
    pub use toolgate_tools::{FnTool, Tool, ToolError, ToolRegistry, ToolResult, ToolSpec};

    #[cfg(feature = "kernel")]
    pub use toolgate_kernel::{ExecutionResult, Executor, Invocation};

    #[cfg(feature = "mcp")]
    pub use toolgate_mcp::{McpAdapter, McpServer};
}
