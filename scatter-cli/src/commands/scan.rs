//! Scan Command
//!
//! Looks for block nodes on a /24 by attempting TCP connects to every host,
//! optionally confirming each open port with `GET /status`.

use crate::symbols;
use anyhow::{Context, Result};
use console::style;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

pub struct ScanConfig {
    pub prefix: Option<String>,
    pub port: u16,
    pub timeout: Duration,
    pub workers: usize,
    pub probe: bool,
}

pub async fn run(config: ScanConfig) -> Result<()> {
    let prefix = match &config.prefix {
        Some(raw) => parse_prefix(raw)?,
        None => local_prefix()?,
    };
    println!(
        "Scanning {}.{}.{}.0/24 for port {} ...",
        prefix[0],
        prefix[1],
        prefix[2],
        config.port
    );

    let pb = ProgressBar::new(254);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} hosts") {
        pb.set_style(style.progress_chars("#>-"));
    }
    let tick = pb.clone();
    let open = scan_subnet(prefix, config.port, config.timeout, config.workers, move || tick.inc(1)).await;
    pb.finish_and_clear();

    if open.is_empty() {
        println!("{} No hosts with port {} open", style("Info:").cyan(), config.port);
        return Ok(());
    }

    let http = if config.probe {
        Some(
            reqwest::Client::builder()
                .timeout(config.timeout.max(Duration::from_secs(2)))
                .build()
                .context("Failed to build HTTP client")?,
        )
    } else {
        None
    };

    for ip in open {
        let addr = SocketAddr::new(IpAddr::V4(ip), config.port);
        match &http {
            Some(client) if probe_node(client, addr).await => {
                println!("{} {} block node", style(symbols::CHECK).green(), addr);
            }
            Some(_) => {
                println!("{} {} open, not a block node", style(symbols::CROSS).yellow(), addr);
            }
            None => println!("{} {} open", style(symbols::CHECK).green(), addr),
        }
    }
    Ok(())
}

/// Hosts `.1` to `.254` of `prefix` that accept a TCP connection on `port`, in address order
pub async fn scan_subnet<F>(
    prefix: [u8; 3],
    port: u16,
    timeout: Duration,
    workers: usize,
    on_host: F,
) -> Vec<Ipv4Addr>
where
    F: Fn(),
{
    let mut open: Vec<Ipv4Addr> = stream::iter(1..=254u8)
        .map(|host| {
            let ip = Ipv4Addr::new(prefix[0], prefix[1], prefix[2], host);
            async move { (ip, is_port_open(SocketAddr::new(IpAddr::V4(ip), port), timeout).await) }
        })
        .buffer_unordered(workers.max(1))
        .filter_map(|(ip, is_open)| {
            on_host();
            async move { is_open.then_some(ip) }
        })
        .collect()
        .await;
    open.sort();
    open
}

async fn is_port_open(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// Whether `addr` answers the node liveness probe
async fn probe_node(client: &reqwest::Client, addr: SocketAddr) -> bool {
    let response = match client.get(format!("http://{}/status", addr)).send().await {
        Ok(r) if r.status().is_success() => r,
        _ => return false,
    };
    match response.json::<serde_json::Value>().await {
        Ok(body) => body.get("status").and_then(|s| s.as_str()) == Some("ok"),
        Err(_) => false,
    }
}

/// Parse `a.b.c` into the three leading octets of a /24
pub fn parse_prefix(raw: &str) -> Result<[u8; 3]> {
    let parts: Vec<&str> = raw.trim().trim_end_matches('.').split('.').collect();
    if parts.len() != 3 {
        anyhow::bail!("Subnet prefix must look like 192.168.1, got '{}'", raw);
    }
    let mut octets = [0u8; 3];
    for (slot, part) in octets.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .with_context(|| format!("Invalid octet '{}' in prefix '{}'", part, raw))?;
    }
    Ok(octets)
}

/// The /24 of this machine's primary IPv4 address
fn local_prefix() -> Result<[u8; 3]> {
    match local_ip_address::local_ip().context("Could not determine local IP; pass --prefix")? {
        IpAddr::V4(ip) => {
            let [a, b, c, _] = ip.octets();
            Ok([a, b, c])
        }
        IpAddr::V6(_) => anyhow::bail!("Local address is IPv6; pass --prefix"),
    }
}
