// SPDX-License-Identifier: Apache-2.0
//! Standalone entrypoint for the WebSocket gateway, for deployments
//! that run it as its own process rather than inside `sail-server`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sailward WebSocket gateway")]
struct Args {
    /// Path to a TOML config file (same schema as `sail-server`).
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Overrides `Config::ws_bind_addr` when set.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let config = sail_config::load(args.config.as_deref()).context("load config")?;
    let listen: SocketAddr = args
        .listen
        .map(Ok)
        .unwrap_or_else(|| config.ws_bind_addr.parse())
        .context("invalid ws_bind_addr")?;

    let (mut scheduler, handle) = sail_session::TickScheduler::spawn(config);

    tokio::select! {
        result = sail_ws_gateway::serve(handle, listen) => result?,
        _ = tokio::signal::ctrl_c() => {},
    }

    scheduler.shutdown();
    Ok(())
}
