//! Gateway settings stored in the catalog

use crate::error::EngineResult;
use scatter_catalog::Catalog;
use scatter_core::{block_size_from_mb, BLOCK_SIZE_SETTING, DEFAULT_BLOCK_SIZE};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SettingsService {
    catalog: Arc<dyn Catalog>,
}

impl SettingsService {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Block size in bytes for new distributions
    pub async fn block_size(&self) -> EngineResult<u64> {
        let raw = self
            .catalog
            .get_setting(BLOCK_SIZE_SETTING, &DEFAULT_BLOCK_SIZE.to_string())
            .await?;
        match raw.trim().parse::<u64>() {
            Ok(size) if size > 0 => Ok(size),
            _ => {
                warn!(value = %raw, "Stored block size is invalid, using default");
                Ok(DEFAULT_BLOCK_SIZE)
            }
        }
    }

    /// Set the block size from a megabyte value in `1..=100`
    pub async fn set_block_size_mb(&self, mb: u64) -> EngineResult<u64> {
        let bytes = block_size_from_mb(mb)?;
        self.catalog
            .set_setting(BLOCK_SIZE_SETTING, &bytes.to_string())
            .await?;
        info!(mb, bytes, "Block size updated");
        Ok(bytes)
    }
}
