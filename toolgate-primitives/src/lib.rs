//! Core shared types for toolgate.
//!
//! These values describe a single call independently of the wire protocol
//! that produced it: who is calling, what log-safe context travels with the
//! call, and the cancellation/deadline signal handed to the tool.

#![warn(missing_docs, clippy::pedantic)]

mod caller;
mod context;
mod error;
mod ids;
mod metadata;

/// Caller principal attached to invocations.
pub use caller::{Caller, CallerBuilder, CallerKind};
/// Cancellation and deadline context passed to tools.
pub use context::CallContext;
/// Error type and result alias for primitive construction.
pub use error::{Error, Result};
/// Unique identifier for a single invocation.
pub use ids::InvocationId;
/// Log-safe key/value context.
pub use metadata::Metadata;

pub use tokio_util::sync::CancellationToken;
