//! Scatter Gateway Daemon
//!
//! Accepts uploads, spreads their blocks over the registered nodes and
//! serves reassembled files back.

use clap::Parser;
use scatter_catalog::{Catalog, MemoryCatalog, SqliteCatalog, SqliteConfig};
use scatter_gateway::{router, AppState, GatewayConfig, HttpBlockClient, TransferConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scatter-gateway")]
#[command(about = "Scatter gateway: block distribution and reassembly")]
#[command(version)]
struct Cli {
    /// HTTP listen address
    #[arg(long, env = "SCATTER_GATEWAY_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// SQLite catalog path
    #[arg(long, env = "SCATTER_DATABASE", default_value = "scatter.db")]
    database: PathBuf,

    /// Keep the catalog in memory instead of SQLite
    #[arg(long, default_value = "false")]
    memory_only: bool,

    /// Staging directory for uploads
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Output directory for reassembled files
    #[arg(long, default_value = "downloads")]
    download_dir: PathBuf,

    /// Shared secret presented to block nodes
    #[arg(long, env = "SCATTER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Block transfers in flight per upload or download (1 = sequential)
    #[arg(long, default_value = "1")]
    transfer_concurrency: usize,

    /// Per-block upload/download timeout in seconds
    #[arg(long, default_value = "60")]
    transfer_timeout_secs: u64,

    /// Enable CORS for all origins (development only)
    #[arg(long, default_value = "false")]
    cors_permissive: bool,

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

    // Initialize tracing; RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Scatter gateway starting...");

    let config = GatewayConfig {
        upload_dir: cli.upload_dir,
        download_dir: cli.download_dir,
        transfer: TransferConfig {
            transfer_timeout: Duration::from_secs(cli.transfer_timeout_secs),
            ..TransferConfig::with_api_key(cli.api_key)
        },
        transfer_concurrency: cli.transfer_concurrency,
    };
    config.validate().map_err(anyhow::Error::msg)?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.download_dir).await?;

    let catalog: Arc<dyn Catalog> = if cli.memory_only {
        warn!("Using in-memory catalog; records are lost on exit");
        Arc::new(MemoryCatalog::new())
    } else {
        let sqlite = SqliteConfig {
            path: cli.database.clone(),
            ..Default::default()
        };
        let catalog = SqliteCatalog::connect(&sqlite).await?;
        info!(path = %cli.database.display(), "Catalog connected");
        Arc::new(catalog)
    };

    let transport = Arc::new(HttpBlockClient::new(config.transfer.clone())?);
    let state = Arc::new(AppState::new(config, catalog, transport));

    let mut app = router(state);
    if cli.cors_permissive {
        warn!("CORS: permissive mode enabled (development only)");
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    info!(addr = %cli.bind, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway shutdown complete");
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
