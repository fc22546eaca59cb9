//! CLI configuration
//!
//! Config directory: ~/.scatter/
//!
//! Config file format (~/.scatter/config.toml):
//! ```toml
//! [gateway]
//! url = "http://localhost:8080"
//!
//! [scan]
//! port = 5001
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Structure of ~/.scatter/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScatterConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub scan: ScanSettings,
}

/// Gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Gateway HTTP API URL
    #[serde(default = "default_gateway_url")]
    pub url: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
        }
    }
}

fn default_gateway_url() -> String {
    "http://localhost:8080".to_string()
}

/// Defaults for `scatter scan`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Node port to probe
    #[serde(default = "default_scan_port")]
    pub port: u16,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            port: default_scan_port(),
        }
    }
}

fn default_scan_port() -> u16 {
    5001
}

/// Get the config directory path (~/.scatter/)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".scatter"))
}

pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration, falling back to defaults when the file is missing or unreadable
pub fn load_config() -> ScatterConfig {
    let path = match config_file_path() {
        Ok(path) if path.exists() => path,
        _ => return ScatterConfig::default(),
    };

    match fs::read_to_string(&path).map_err(anyhow::Error::from).and_then(|content| {
        toml::from_str::<ScatterConfig>(&content).map_err(anyhow::Error::from)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Failed to load config file {}: {}", path.display(), e);
            ScatterConfig::default()
        }
    }
}

pub fn save_config(config: &ScatterConfig) -> Result<()> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir).context("Failed to create config directory ~/.scatter/")?;
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(dir.join("config.toml"), content).context("Failed to write config file")?;
    Ok(())
}

/// Gateway URL precedence: --gateway / SCATTER_GATEWAY, then the config file
pub fn resolve_gateway_url(cli_value: Option<String>, config: &ScatterConfig) -> String {
    cli_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| config.gateway.url.clone())
}
