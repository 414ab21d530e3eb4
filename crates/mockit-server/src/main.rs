//! MockIt server binary.

use anyhow::Context;
use clap::Parser;
use mockit_server::{AdminApiServer, ConfigStore, MockServer, ProxyForwarder, RouteDispatcher};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Config-driven HTTP mock server
#[derive(Parser, Debug)]
#[command(name = "mockit-server")]
#[command(author, version, about = "Serve mock HTTP routes from a JSON configuration")]
struct Args {
    /// Port for the mock routes
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Port for the admin API
    #[arg(long, env = "ADMIN_PORT", default_value = "4000")]
    admin_port: u16,

    /// Do not start the admin API
    #[arg(long)]
    no_admin: bool,

    /// Path to the routes document
    #[arg(short, long, env = "MOCKIT_CONFIG", default_value = "configuration/routes.json")]
    config: PathBuf,

    /// Address to bind both listeners to
    #[arg(long, env = "MOCKIT_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Timeout for proxied requests, in seconds
    #[arg(long, env = "MOCKIT_PROXY_TIMEOUT_SECS", default_value = "30")]
    proxy_timeout_secs: u64,

    /// Execution mode; `test` loads the configuration and exits
    #[arg(long, env = "ENV", default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let store = ConfigStore::open(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let store = Arc::new(store);

    if args.env == "test" {
        let snapshot = store.snapshot();
        info!(
            routes = snapshot.document.routes.len(),
            served = snapshot.table.len(),
            "Configuration OK, not listening in test mode"
        );
        return Ok(());
    }

    let forwarder = ProxyForwarder::new(Duration::from_secs(args.proxy_timeout_secs))
        .context("Failed to build proxy client")?;
    let server = MockServer::new(Arc::clone(&store), RouteDispatcher::new(forwarder));

    if !args.no_admin {
        let admin_addr = SocketAddr::new(args.host, args.admin_port);
        let admin = AdminApiServer::new(admin_addr, Arc::clone(&store));
        tokio::spawn(async move {
            if let Err(e) = admin.run().await {
                error!("Admin API stopped: {:#}", e);
            }
        });
    }

    tokio::select! {
        result = server.run(SocketAddr::new(args.host, args.port)) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
