//! Upload Command
//!
//! Sends a local file to the gateway, which splits and distributes it.

use super::{format_bytes, transfer_bar};
use crate::client::GatewayClient;
use crate::symbols;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub struct UploadConfig {
    pub path: String,
}

pub async fn run(client: &GatewayClient, config: UploadConfig) -> Result<()> {
    let path = Path::new(&config.path);
    if !path.is_file() {
        anyhow::bail!("Not a file: {}", config.path);
    }

    let size = tokio::fs::metadata(path).await?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.path.clone());

    let pb = transfer_bar(size, format!("Uploading {}", name));
    let tick = pb.clone();
    let result = client
        .upload_file(path, move |n| tick.inc(n))
        .await
        .with_context(|| format!("Failed to upload file to {}", client.base_url()));
    pb.finish_and_clear();
    let details = result?;

    println!(
        "{} {} distributed as file {}",
        style(symbols::CHECK).green(),
        style(&details.file.original_name).bold(),
        style(details.file.id).cyan()
    );
    println!("  Size:   {}", format_bytes(details.file.total_size.max(0) as u64));
    println!(
        "  Blocks: {} x {}",
        details.file.block_count,
        format_bytes(details.file.block_size.max(0) as u64)
    );
    println!("  SHA256: {}", details.file.content_hash);

    Ok(())
}
