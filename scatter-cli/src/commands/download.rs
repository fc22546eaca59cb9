//! Download Command
//!
//! Fetches a reassembled file from the gateway.

use super::{format_bytes, transfer_bar};
use crate::client::GatewayClient;
use crate::symbols;
use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

pub struct DownloadConfig {
    pub id: i64,
    pub output: PathBuf,
}

pub async fn run(client: &GatewayClient, config: DownloadConfig) -> Result<()> {
    let details = client
        .get_file(config.id)
        .await
        .context("Failed to look up file")?;

    let pb = transfer_bar(
        details.file.total_size.max(0) as u64,
        format!("Downloading {}", details.file.original_name),
    );
    let result = client
        .download_file(config.id, &config.output, |n| pb.inc(n))
        .await
        .context("Failed to download file");
    pb.finish_and_clear();
    let (path, size) = result?;

    println!(
        "{} Downloaded {} ({})",
        style(symbols::CHECK).green(),
        style(&details.file.original_name).bold(),
        format_bytes(size)
    );
    println!("  Saved to: {}", path.display());

    Ok(())
}
