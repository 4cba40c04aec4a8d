// SPDX-License-Identifier: Apache-2.0
//! Sailward server daemon: loads configuration, starts the tick
//! thread, and hosts whichever transports are enabled.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sailward authoritative server")]
struct Args {
    /// Path to a TOML config file overriding environment/defaults.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Disable the WebSocket gateway.
    #[arg(long)]
    no_ws: bool,
    /// Disable the UDP gateway.
    #[arg(long)]
    no_udp: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let config = sail_config::load(args.config.as_deref()).context("load config")?;
    info!(tick_rate = config.tick_rate, "loaded configuration");

    let ws_addr: std::net::SocketAddr = config.ws_bind_addr.parse().context("invalid ws_bind_addr")?;
    let udp_addr: std::net::SocketAddr = config.udp_bind_addr.parse().context("invalid udp_bind_addr")?;

    let (mut scheduler, handle) = sail_session::TickScheduler::spawn(config);

    let ws_task = (!args.no_ws).then(|| {
        let handle = handle.clone();
        tokio::spawn(async move { sail_ws_gateway::serve(handle, ws_addr).await })
    });
    let udp_task = (!args.no_udp).then(|| {
        let handle = handle.clone();
        tokio::spawn(async move { sail_udp_gateway::serve(handle, udp_addr).await })
    });

    if ws_task.is_none() && udp_task.is_none() {
        error!("both gateways disabled, nothing to serve");
        scheduler.shutdown();
        return Ok(());
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        result = wait_for_either(ws_task, udp_task) => {
            if let Err(err) = result {
                error!(%err, "a gateway task failed");
            }
        }
    }

    scheduler.shutdown();
    Ok(())
}

/// Waits on whichever enabled gateway tasks are present, returning as
/// soon as one finishes (normally only on error or process exit).
async fn wait_for_either(
    ws_task: Option<tokio::task::JoinHandle<Result<()>>>,
    udp_task: Option<tokio::task::JoinHandle<Result<()>>>,
) -> Result<()> {
    match (ws_task, udp_task) {
        (Some(ws), Some(udp)) => tokio::select! {
            res = ws => res.context("ws gateway task panicked")?,
            res = udp => res.context("udp gateway task panicked")?,
        },
        (Some(ws), None) => ws.await.context("ws gateway task panicked")?,
        (None, Some(udp)) => udp.await.context("udp gateway task panicked")?,
        (None, None) => std::future::pending().await,
    }
}
