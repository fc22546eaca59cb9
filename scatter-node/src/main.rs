//! Scatter Block Node Daemon
//!
//! Stores blocks pushed by a gateway and serves them back on request.

use clap::Parser;
use scatter_node::{init_metrics, router, BlockStore, NodeConfig, NodeState};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "scatter-node")]
#[command(about = "Scatter block node daemon")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "node.toml")]
    config: PathBuf,

    /// Listen address (overrides config file)
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// Listen port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Shared secret required on writes (overrides config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Only accept block paths under this directory
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_max_level(level).init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .init();
    }

    info!("Scatter block node starting...");

    // Priority: CLI args > environment > config file > defaults
    let config = NodeConfig::load_or_default(&cli.config)
        .with_env_overrides()
        .with_overrides(cli.bind, cli.port, cli.api_key, cli.storage_root);
    config.validate()?;

    let store = match &config.storage.root {
        Some(root) => {
            tokio::fs::create_dir_all(root).await?;
            info!(root = %root.display(), "Block paths confined to storage root");
            BlockStore::confined(root)
        }
        None => {
            warn!("No storage root configured; block paths are not confined");
            BlockStore::unconfined()
        }
    };

    let mut state = NodeState::new(store, config.auth.api_key.clone());
    if config.metrics.enabled {
        match init_metrics() {
            Ok(handle) => state = state.with_metrics(handle),
            Err(e) => warn!(error = %e, "Metrics disabled"),
        }
    }

    let app = router(Arc::new(state), config.max_body_bytes());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Block node listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Block node shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
