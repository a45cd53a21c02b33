//! Model Context Protocol boundary for toolgate.
//!
//! [`McpAdapter`] publishes registered tools as MCP tool descriptors and
//! translates `tools/call` requests into executor invocations. Tool failures
//! are reported inside the call result, never as protocol errors.
//! [`McpServer`] drives the adapter over newline-delimited JSON-RPC, usually
//! on stdin/stdout.

#![warn(missing_docs, clippy::pedantic)]

pub mod adapter;
pub mod protocol;
pub mod server;
pub mod transport;

pub use adapter::{AdapterError, McpAdapter};
pub use protocol::{
    CallToolParams, CallToolResult, Content, Implementation, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, RequestId, ToolDescriptor,
};
pub use server::{McpServer, ServerError};
pub use transport::{FrameReader, FrameWriter, TransportError};
