//! Info Command
//!
//! Shows a file and where each of its blocks lives.

use super::format_bytes;
use crate::client::GatewayClient;
use anyhow::{Context, Result};
use console::style;

pub async fn run(client: &GatewayClient, id: i64) -> Result<()> {
    let details = client.get_file(id).await.context("Failed to get file")?;
    let file = &details.file;

    println!();
    println!("{}", style(&file.original_name).bold().underlined());
    println!("  ID:         {}", file.id);
    println!("  Size:       {} ({} bytes)", format_bytes(file.total_size.max(0) as u64), file.total_size);
    println!("  Block size: {}", format_bytes(file.block_size.max(0) as u64));
    println!("  Blocks:     {}", file.block_count);
    println!("  Status:     {}", file.status);
    println!("  Created:    {}", file.created_at.to_rfc3339());
    println!("  SHA256:     {}", file.content_hash);
    println!();

    if details.blocks.is_empty() {
        return Ok(());
    }

    println!(
        "  {:>5}  {:>10}  {:<28} {}",
        style("BLOCK").bold(),
        style("SIZE").bold(),
        style("NODE").bold(),
        style("PATH").bold()
    );
    for block in &details.blocks {
        println!(
            "  {:>5}  {:>10}  {:<28} {}",
            block.block_number,
            format_bytes(block.size.max(0) as u64),
            block.machine_url,
            block.storage_path
        );
    }
    println!();
    Ok(())
}
