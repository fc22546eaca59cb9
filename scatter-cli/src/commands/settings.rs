//! Settings Commands

use crate::client::GatewayClient;
use crate::symbols;
use anyhow::{Context, Result};
use console::style;
use scatter_core::{MAX_BLOCK_SIZE_MB, MIN_BLOCK_SIZE_MB};

pub async fn show(client: &GatewayClient) -> Result<()> {
    let settings = client.settings().await.context("Failed to load settings")?;
    println!(
        "Block size: {} MB ({} bytes)",
        style(settings.block_size_mb).cyan(),
        settings.block_size
    );
    Ok(())
}

pub async fn set_block_size(client: &GatewayClient, mb: u64) -> Result<()> {
    if !(MIN_BLOCK_SIZE_MB..=MAX_BLOCK_SIZE_MB).contains(&mb) {
        anyhow::bail!(
            "Block size must be between {} and {} MB",
            MIN_BLOCK_SIZE_MB,
            MAX_BLOCK_SIZE_MB
        );
    }
    let settings = client
        .set_block_size(mb)
        .await
        .context("Failed to update block size")?;
    println!(
        "{} Block size set to {} MB",
        style(symbols::CHECK).green(),
        settings.block_size_mb
    );
    Ok(())
}
