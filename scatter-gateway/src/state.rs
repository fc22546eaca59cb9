//! Application State
//!
//! Shared state for all gateway handlers: the catalog, the node transport and
//! the engines built on top of them.

use crate::deletion::{delete_file, DeletionReport};
use crate::distribution::DistributionEngine;
use crate::error::EngineResult;
use crate::node_client::{BlockTransport, TransferConfig};
use crate::reassembly::ReassemblyEngine;
use crate::registry::MachineRegistry;
use crate::settings::SettingsService;
use scatter_catalog::{Catalog, FileId};
use std::path::PathBuf;
use std::sync::Arc;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Where multipart uploads are staged before distribution
    pub upload_dir: PathBuf,

    /// Where reassembled files are written before being streamed back
    pub download_dir: PathBuf,

    /// Node client settings
    pub transfer: TransferConfig,

    /// Block transfers/fetches in flight per operation
    pub transfer_concurrency: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            download_dir: PathBuf::from("downloads"),
            transfer: TransferConfig::default(),
            transfer_concurrency: 1,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.transfer.api_key.is_empty() {
            return Err("Node API key must be set".to_string());
        }
        if self.transfer_concurrency == 0 {
            return Err("Transfer concurrency must be at least 1".to_string());
        }
        if self.upload_dir.as_os_str().is_empty() || self.download_dir.as_os_str().is_empty() {
            return Err("Upload and download directories must be set".to_string());
        }
        Ok(())
    }
}

/// Shared application state
pub struct AppState {
    pub config: GatewayConfig,
    pub catalog: Arc<dyn Catalog>,
    pub transport: Arc<dyn BlockTransport>,
    pub distribution: DistributionEngine,
    pub reassembly: ReassemblyEngine,
    pub registry: MachineRegistry,
    pub settings: SettingsService,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        catalog: Arc<dyn Catalog>,
        transport: Arc<dyn BlockTransport>,
    ) -> Self {
        let concurrency = config.transfer_concurrency;
        Self {
            distribution: DistributionEngine::new(catalog.clone(), transport.clone())
                .with_concurrency(concurrency),
            reassembly: ReassemblyEngine::new(catalog.clone(), transport.clone())
                .with_concurrency(concurrency),
            registry: MachineRegistry::new(catalog.clone(), transport.clone()),
            settings: SettingsService::new(catalog.clone()),
            config,
            catalog,
            transport,
        }
    }

    pub async fn delete_file(&self, file_id: FileId) -> EngineResult<DeletionReport> {
        delete_file(
            self.catalog.as_ref(),
            self.transport.as_ref(),
            file_id,
            self.config.transfer_concurrency,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = GatewayConfig::default();
        assert!(config.validate().is_err());

        config.transfer.api_key = "secret".into();
        assert!(config.validate().is_ok());

        config.transfer_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
