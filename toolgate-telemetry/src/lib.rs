//! Logging setup for toolgate processes.
//!
//! Log lines always go to stderr: stdout carries the MCP channel when a
//! server runs over stdio.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; `fallback` (for example `"info"` or
/// `"toolgate_mcp=debug"`) applies when it is unset.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or a global subscriber
/// is already installed.
pub fn init_tracing(fallback: &str) -> anyhow::Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(env.as_deref(), fallback)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;
    tracing::debug!(filter = fallback, "tracing initialised");
    Ok(())
}

fn resolve_filter(env: Option<&str>, fallback: &str) -> anyhow::Result<EnvFilter> {
    match env.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).with_context(|| {
            format!("invalid {} directives `{directives}`", EnvFilter::DEFAULT_ENV)
        }),
        None => {
            EnvFilter::try_new(fallback).with_context(|| format!("invalid log filter `{fallback}`"))
        }
    }
}
