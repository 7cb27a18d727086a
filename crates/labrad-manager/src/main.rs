//! LabRAD Manager - directory service for instrument servers.
//!
//! Servers register their settings here and clients turn server and setting
//! names into IDs. The directory is reachable over the framed IPC transport
//! and, for tooling, as JSON-RPC over HTTP.

mod handler;
mod server;

use anyhow::Result;
use clap::Parser;
use labrad_core::ipc::IpcServer;
use labrad_core::{ManagerConfig, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "labrad-manager")]
#[command(about = "Directory service for LabRAD servers")]
struct Args {
    /// Host to bind both listeners to
    #[arg(long, default_value = ManagerConfig::DEFAULT_HOST)]
    host: String,

    /// IPC port (0 = auto-assign)
    #[arg(long, default_value_t = ManagerConfig::DEFAULT_IPC_PORT)]
    ipc_port: u16,

    /// HTTP JSON-RPC port (0 = auto-assign)
    #[arg(long, default_value_t = ManagerConfig::DEFAULT_HTTP_PORT)]
    http_port: u16,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting LabRAD manager");

    let registry = Arc::new(Registry::new());

    let ipc_addr: SocketAddr = format!("{}:{}", args.host, args.ipc_port).parse()?;
    let mut ipc = IpcServer::start_on(ipc_addr, registry.clone()).await?;
    let http_addr = server::start_server(registry, &args.host, args.http_port).await?;

    // Read by launchers and tests to discover auto-assigned ports
    println!("IPC_PORT={}", ipc.addr().port());
    println!("HTTP_PORT={}", http_addr.port());

    info!("Directory on {} (IPC) and {} (HTTP)", ipc.addr(), http_addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    ipc.shutdown();

    Ok(())
}
