//! Invocation executor for toolgate.
//!
//! This crate turns a named call plus JSON input into a protocol-agnostic
//! execution: it resolves the tool in a [`ToolRegistry`](toolgate_tools::ToolRegistry),
//! runs it with the caller's [`CallContext`](toolgate_primitives::CallContext), and
//! captures the outcome together with executor-measured wall time.

#![warn(missing_docs, clippy::pedantic)]

mod executor;
mod invocation;
mod result;
mod scheduler;

pub use executor::Executor;
pub use invocation::Invocation;
pub use result::{ExecutionError, ExecutionResult};
pub use scheduler::{DispatchScheduler, SchedulerConfig, SchedulerError, SchedulerResult};
