//! MCP server over stdio exposing the demo tools.
//!
//! ```text
//! toolgate-stdio --config toolgate.toml
//! RUST_LOG=toolgate_mcp=debug toolgate-stdio
//! ```

mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use toolgate::config::ServerConfig;
use toolgate::kernel::{DispatchScheduler, SchedulerConfig};
use toolgate::mcp::Implementation;
use toolgate::prelude::*;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "toolgate-stdio", version, about = "Serve demo tools over MCP stdio")]
struct Cli {
    /// TOML configuration file. Defaults to `./toolgate.toml` when present.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the published tool descriptors as JSON and exit.
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    toolgate::telemetry::init_tracing(&config.log_filter)?;

    let registry = Arc::new(ToolRegistry::new());
    tools::register_demo_tools(&registry)?;
    let adapter = Arc::new(McpAdapter::from_registry(Arc::clone(&registry)));
    let published = adapter
        .register_all()
        .context("failed to publish demo tools")?;

    if cli.list_tools {
        println!("{}", serde_json::to_string_pretty(&adapter.list_tools())?);
        return Ok(());
    }

    let scheduler = DispatchScheduler::new(
        config
            .max_in_flight_limit()
            .map_or_else(SchedulerConfig::unbounded, SchedulerConfig::bounded),
    );
    info!(
        server = %config.name,
        tools = published,
        max_in_flight = ?config.max_in_flight,
        "serving over stdio"
    );
    let server = Arc::new(
        McpServer::new(adapter, Implementation::new(config.name, config.version))
            .with_scheduler(scheduler)
            .with_instructions("Call `echo` or `calculator_arithmetic`."),
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                shutdown.cancel();
            }
        }
    });

    server.serve_stdio(shutdown).await?;
    Ok(())
}
