//! Scatter CLI
//!
//! Command-line client for a scatter gateway.
//!
//! # Commands
//! - `upload` - Distribute a local file
//! - `download` - Fetch a reassembled file
//! - `list` / `info` / `delete` - Inspect and remove files
//! - `machines` - Manage block nodes
//! - `settings` - Show or change the block size
//! - `scan` - Find block nodes on the local subnet
//! - `config` - Show or edit configuration
//!
//! # Configuration
//! Config file: ~/.scatter/config.toml

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::time::Duration;

mod client;
mod commands;
mod config;
mod symbols;

use client::{GatewayClient, MachineRequest};
use commands::machines::MachineAction;
use commands::{delete, download, info, list, machines, scan, settings, upload};

#[derive(Parser)]
#[command(name = "scatter")]
#[command(about = "Scatter distributed block storage CLI")]
#[command(version)]
struct Cli {
    /// Gateway HTTP URL (overrides config file)
    #[arg(long, global = true, env = "SCATTER_GATEWAY")]
    gateway: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and distribute its blocks
    Upload {
        /// Path to the file
        path: String,
    },

    /// Download and reassemble a file
    Download {
        /// File ID
        id: i64,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// List distributed files
    List {
        /// Only files with this status (distributed, deleted)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a file and its block placement
    Info {
        /// File ID
        id: i64,
    },

    /// Delete a file and its blocks
    Delete {
        /// File ID
        id: i64,

        /// Delete without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Manage block nodes
    Machines {
        #[command(subcommand)]
        command: MachineCommands,
    },

    /// Show or change gateway settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },

    /// Scan a /24 subnet for block nodes
    Scan {
        /// Subnet prefix such as 192.168.1 (defaults to the local /24)
        #[arg(long)]
        prefix: Option<String>,

        /// Port to probe (defaults to the config file, then 5001)
        #[arg(long)]
        port: Option<u16>,

        /// Connect timeout per host in milliseconds
        #[arg(long, default_value = "500")]
        timeout_ms: u64,

        /// Concurrent connection attempts
        #[arg(long, default_value = "100")]
        workers: usize,

        /// Confirm open hosts with GET /status
        #[arg(long)]
        probe: bool,
    },

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum MachineCommands {
    /// List registered machines
    List,

    /// Register a machine
    Add {
        name: String,
        /// Node address, e.g. 192.168.1.20:5001
        url: String,
        /// Block directory on the node
        storage_path: String,
    },

    /// Replace a machine's name, address and storage path
    Edit {
        id: i64,
        name: String,
        url: String,
        storage_path: String,
    },

    /// Activate or deactivate a machine
    Toggle { id: i64 },

    /// Remove a machine
    Remove { id: i64 },

    /// Probe one machine, or all when no ID is given
    Check { id: Option<i64> },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current settings
    Show,

    /// Set the block size for new uploads, in MB (1-100)
    BlockSize { mb: u64 },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (gateway.url, scan.port)
        key: String,
        /// Value to set
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let cfg = config::load_config();
    let gateway_url = config::resolve_gateway_url(cli.gateway, &cfg);
    tracing::debug!(gateway = %gateway_url, "Using gateway");

    let connect = || GatewayClient::new(&gateway_url);

    match cli.command {
        Commands::Upload { path } => {
            upload::run(&connect()?, upload::UploadConfig { path }).await?;
        }

        Commands::Download { id, output } => {
            download::run(&connect()?, download::DownloadConfig { id, output }).await?;
        }

        Commands::List { status } => {
            list::run(&connect()?, list::ListConfig { status }).await?;
        }

        Commands::Info { id } => {
            info::run(&connect()?, id).await?;
        }

        Commands::Delete { id, force } => {
            delete::run(&connect()?, delete::DeleteConfig { id, force }).await?;
        }

        Commands::Machines { command } => {
            let action = match command {
                MachineCommands::List => MachineAction::List,
                MachineCommands::Add {
                    name,
                    url,
                    storage_path,
                } => MachineAction::Add(MachineRequest {
                    name,
                    url,
                    storage_path,
                }),
                MachineCommands::Edit {
                    id,
                    name,
                    url,
                    storage_path,
                } => MachineAction::Edit {
                    id,
                    request: MachineRequest {
                        name,
                        url,
                        storage_path,
                    },
                },
                MachineCommands::Toggle { id } => MachineAction::Toggle { id },
                MachineCommands::Remove { id } => MachineAction::Remove { id },
                MachineCommands::Check { id } => MachineAction::Check { id },
            };
            machines::run(&connect()?, action).await?;
        }

        Commands::Settings { command } => {
            let client = connect()?;
            match command {
                None | Some(SettingsCommands::Show) => settings::show(&client).await?,
                Some(SettingsCommands::BlockSize { mb }) => {
                    settings::set_block_size(&client, mb).await?
                }
            }
        }

        // Scan and config never talk to the gateway
        Commands::Scan {
            prefix,
            port,
            timeout_ms,
            workers,
            probe,
        } => {
            let config = scan::ScanConfig {
                prefix,
                port: port.unwrap_or(cfg.scan.port),
                timeout: Duration::from_millis(timeout_ms),
                workers,
                probe,
            };
            scan::run(config).await?;
        }

        Commands::Config { command } => {
            handle_config_command(command)?;
        }
    }

    Ok(())
}

/// Handle config subcommands
fn handle_config_command(command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let cfg = config::load_config();
            println!();
            println!("{}", style("Scatter Configuration").bold().underlined());
            println!();
            println!("{}", style("[gateway]").cyan());
            println!("  url = \"{}\"", cfg.gateway.url);
            println!();
            println!("{}", style("[scan]").cyan());
            println!("  port = {}", cfg.scan.port);
            println!();

            if let Ok(path) = config::config_file_path() {
                println!("{} {}", style("Config file:").dim(), path.display());
                if !path.exists() {
                    println!(
                        "{} Run '{}' to create it",
                        style("(not created yet)").yellow(),
                        style("scatter config init").green()
                    );
                }
            }
        }

        Some(ConfigCommands::Path) => {
            println!("{}", config::config_file_path()?.display());
        }

        Some(ConfigCommands::Init { force }) => {
            let path = config::config_file_path()?;
            if path.exists() && !force {
                println!(
                    "{} Config file already exists at {}",
                    style(symbols::WARN).yellow(),
                    path.display()
                );
                println!("Use --force to overwrite");
                return Ok(());
            }

            config::save_config(&config::ScatterConfig::default())?;
            println!(
                "{} Config file created at {}",
                style(symbols::CHECK).green(),
                path.display()
            );
        }

        Some(ConfigCommands::Set { key, value }) => {
            let mut cfg = config::load_config();

            match key.as_str() {
                "gateway.url" => cfg.gateway.url = value,
                "scan.port" => {
                    cfg.scan.port = value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid port: {}", value))?
                }
                _ => {
                    anyhow::bail!("Unknown config key: {}. Valid keys: gateway.url, scan.port", key);
                }
            }

            config::save_config(&cfg)?;
            println!("{} Configuration updated", style(symbols::CHECK).green());
        }
    }

    Ok(())
}
