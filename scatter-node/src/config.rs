//! Configuration management for the block node
//!
//! Supports loading from TOML files, CLI overrides and environment variables.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Complete node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerSettings,

    /// Shared secret for write requests
    #[serde(default)]
    pub auth: AuthSettings,

    /// Block storage
    #[serde(default)]
    pub storage: StorageSettings,

    /// Prometheus metrics
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "API key must be set ([auth] api_key, --api-key or SCATTER_API_KEY)".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Port cannot be 0".to_string(),
            ));
        }

        if self.server.max_block_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "max_block_size_mb must be positive".to_string(),
            ));
        }

        if let Some(root) = &self.storage.root {
            if !root.is_absolute() {
                return Err(ConfigError::ValidationError(format!(
                    "Storage root must be an absolute path, got {:?}",
                    root
                )));
            }
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        bind: Option<IpAddr>,
        port: Option<u16>,
        api_key: Option<String>,
        storage_root: Option<PathBuf>,
    ) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(key) = api_key {
            self.auth.api_key = key;
        }
        if let Some(root) = storage_root {
            self.storage.root = Some(root);
        }
        self
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("SCATTER_API_KEY") {
            self.auth.api_key = key;
        }

        if let Some(port) = std::env::var("SCATTER_NODE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        if let Some(bind) = std::env::var("SCATTER_NODE_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.bind = bind;
        }

        if let Ok(root) = std::env::var("SCATTER_STORAGE_ROOT") {
            self.storage.root = Some(PathBuf::from(root));
        }

        self
    }

    /// Address the HTTP server listens on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind, self.server.port)
    }

    /// Largest accepted upload request body
    pub fn max_body_bytes(&self) -> usize {
        // Room for multipart framing on top of the block itself
        (self.server.max_block_size_mb as usize) * 1024 * 1024 + 64 * 1024
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a single block upload
    #[serde(default = "default_max_block_size_mb")]
    pub max_block_size_mb: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_block_size_mb: default_max_block_size_mb(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5001
}

fn default_max_block_size_mb() -> u64 {
    128
}

/// Authentication settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Value required in the `X-API-KEY` header on writes
    #[serde(default)]
    pub api_key: String,
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// When set, only paths under this directory are accepted.
    /// When unset, any path the caller sends is used as-is.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Serve Prometheus metrics at `/metrics`
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.server.max_block_size_mb, 128);
        assert!(config.storage.root.is_none());
        assert!(config.metrics.enabled);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:5001");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [server]
            bind = "127.0.0.1"
            port = 6001

            [auth]
            api_key = "s3cret"

            [storage]
            root = "/srv/blocks"

            [metrics]
            enabled = false
        "#;

        let config: NodeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:6001");
        assert_eq!(config.auth.api_key, "s3cret");
        assert_eq!(config.storage.root, Some(PathBuf::from("/srv/blocks")));
        assert!(!config.metrics.enabled);
        assert_eq!(config.server.max_block_size_mb, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = NodeConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = NodeConfig::default();
        config.auth.api_key = "key".into();
        assert!(config.validate().is_ok());

        config.storage.root = Some(PathBuf::from("relative/dir"));
        assert!(config.validate().is_err());

        config.storage.root = None;
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_overrides() {
        let config = NodeConfig::default().with_overrides(
            Some(IpAddr::from([127, 0, 0, 1])),
            Some(7000),
            Some("cli-key".into()),
            Some(PathBuf::from("/data")),
        );

        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:7000");
        assert_eq!(config.auth.api_key, "cli-key");
        assert_eq!(config.storage.root, Some(PathBuf::from("/data")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "[auth]\napi_key = \"file-key\"\n").unwrap();

        let config = NodeConfig::load_or_default(&path);
        assert_eq!(config.auth.api_key, "file-key");

        let missing = NodeConfig::load_or_default(dir.path().join("absent.toml"));
        assert!(missing.auth.api_key.is_empty());

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            NodeConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
