//! Delete Command

use crate::client::{ClientError, GatewayClient};
use crate::symbols;
use anyhow::{Context, Result};
use console::style;

pub struct DeleteConfig {
    pub id: i64,
    pub force: bool,
}

pub async fn run(client: &GatewayClient, config: DeleteConfig) -> Result<()> {
    let details = match client.get_file(config.id).await {
        Ok(details) => details,
        Err(ClientError::NotFound(_)) => {
            println!("{} File {} not found", style("Error:").red(), config.id);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to check file"),
    };

    if !config.force {
        println!(
            "{} About to delete {} ({} blocks)",
            style(symbols::WARN).yellow(),
            style(&details.file.original_name).bold(),
            details.file.block_count
        );
        println!("\nUse --force to delete without confirmation.");
        return Ok(());
    }

    let report = client
        .delete_file(config.id)
        .await
        .context("Failed to delete file")?;

    println!(
        "{} Deleted file {} ({} block records removed)",
        style(symbols::CHECK).green(),
        report.file_id,
        report.blocks_removed
    );
    Ok(())
}
