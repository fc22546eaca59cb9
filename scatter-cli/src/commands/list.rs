//! List Command

use super::{format_bytes, truncate};
use crate::client::GatewayClient;
use crate::symbols;
use anyhow::{Context, Result};
use console::style;

pub struct ListConfig {
    pub status: Option<String>,
}

pub async fn run(client: &GatewayClient, config: ListConfig) -> Result<()> {
    let files = client
        .list_files(config.status.as_deref())
        .await
        .context("Failed to list files")?;

    if files.is_empty() {
        println!("{} No files found", style("Info:").cyan());
        return Ok(());
    }

    println!(
        "{:>6}  {:<32} {:>12} {:>7}  {:<12} {}",
        style("ID").bold(),
        style("NAME").bold(),
        style("SIZE").bold(),
        style("BLOCKS").bold(),
        style("STATUS").bold(),
        style("CREATED").bold()
    );
    println!("{}", symbols::rule(96));

    let mut total: u64 = 0;
    for file in &files {
        let size = file.total_size.max(0) as u64;
        total += size;
        println!(
            "{:>6}  {:<32} {:>12} {:>7}  {:<12} {}",
            file.id,
            truncate(&file.original_name, 32),
            format_bytes(size),
            file.block_count,
            file.status,
            file.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("{}", symbols::rule(96));
    println!(
        "{} files, {} total",
        style(files.len()).green(),
        format_bytes(total)
    );
    Ok(())
}
