//! Tool capabilities and the registry that names them.
//!
//! A [`Tool`] identifies itself, describes its input through a [`ToolSpec`],
//! and executes against a JSON input. The [`ToolRegistry`] maps stable names
//! to tool implementations and is safe to share across tasks.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod registry;
pub mod tool;

pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolSpec, default_input_schema};
