//! Gateway Client
//!
//! HTTP client for the scatter gateway's JSON API.

use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// A distributed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: i64,
    pub original_name: String,
    pub content_hash: String,
    pub total_size: i64,
    pub block_count: i64,
    pub block_size: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Where one block lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub block_number: i64,
    pub content_hash: String,
    pub size: i64,
    pub machine_url: String,
    pub storage_path: String,
}

/// File with its blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDetails {
    pub file: FileInfo,
    pub blocks: Vec<BlockInfo>,
}

/// Registered block node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInfo {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub storage_path: String,
    pub is_active: bool,
    pub last_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineStatus {
    pub machine: MachineInfo,
    pub online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRequest {
    pub name: String,
    pub url: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionReport {
    pub file_id: i64,
    pub blocks_removed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub block_size: u64,
    pub block_size_mb: f64,
}

/// Gateway client
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(3600))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Files =====

    /// Upload a local file; `progress` receives the byte count of each chunk sent
    pub async fn upload_file<F>(&self, path: &Path, progress: F) -> Result<FileDetails>
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let file = File::open(path).await?;
        let size = file.metadata().await?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let stream = ReaderStream::new(file).inspect_ok(move |chunk| progress(chunk.len() as u64));
        let part = Part::stream_with_length(Body::wrap_stream(stream), size).file_name(name);
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/v1/files"))
            .multipart(form)
            .send()
            .await?;
        Ok(check(response, "upload").await?.json().await?)
    }

    pub async fn list_files(&self, status: Option<&str>) -> Result<Vec<FileInfo>> {
        let mut req = self.client.get(self.url("/api/v1/files"));
        if let Some(status) = status {
            req = req.query(&[("status", status)]);
        }
        let response = req.send().await?;
        Ok(check(response, "files").await?.json().await?)
    }

    pub async fn get_file(&self, id: i64) -> Result<FileDetails> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/files/{id}")))
            .send()
            .await?;
        Ok(check(response, &format!("file {id}")).await?.json().await?)
    }

    /// Download a file into `dir`, returning the written path and size.
    ///
    /// `progress` receives the byte count of each chunk written.
    pub async fn download_file<F>(&self, id: i64, dir: &Path, progress: F) -> Result<(PathBuf, u64)>
    where
        F: Fn(u64),
    {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/files/{id}/download")))
            .send()
            .await?;
        let response = check(response, &format!("file {id}")).await?;

        let name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| format!("file_{id}"));

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(name);
        let mut out = File::create(&path).await?;
        let mut written = 0u64;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(out);
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(e.into());
                }
            };
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress(chunk.len() as u64);
        }
        out.flush().await?;

        Ok((path, written))
    }

    pub async fn delete_file(&self, id: i64) -> Result<DeletionReport> {
        let response = self
            .client
            .delete(self.url(&format!("/api/v1/files/{id}")))
            .send()
            .await?;
        Ok(check(response, &format!("file {id}")).await?.json().await?)
    }

    // ===== Machines =====

    pub async fn list_machines(&self) -> Result<Vec<MachineInfo>> {
        let response = self.client.get(self.url("/api/v1/machines")).send().await?;
        Ok(check(response, "machines").await?.json().await?)
    }

    pub async fn add_machine(&self, req: &MachineRequest) -> Result<MachineInfo> {
        let response = self
            .client
            .post(self.url("/api/v1/machines"))
            .json(req)
            .send()
            .await?;
        Ok(check(response, "machines").await?.json().await?)
    }

    pub async fn update_machine(&self, id: i64, req: &MachineRequest) -> Result<MachineInfo> {
        let response = self
            .client
            .put(self.url(&format!("/api/v1/machines/{id}")))
            .json(req)
            .send()
            .await?;
        Ok(check(response, &format!("machine {id}")).await?.json().await?)
    }

    pub async fn toggle_machine(&self, id: i64) -> Result<MachineInfo> {
        let response = self
            .client
            .post(self.url(&format!("/api/v1/machines/{id}/toggle")))
            .send()
            .await?;
        Ok(check(response, &format!("machine {id}")).await?.json().await?)
    }

    pub async fn remove_machine(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/v1/machines/{id}")))
            .send()
            .await?;
        check(response, &format!("machine {id}")).await?;
        Ok(())
    }

    pub async fn machine_status(&self, id: i64) -> Result<MachineStatus> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/machines/{id}/status")))
            .send()
            .await?;
        Ok(check(response, &format!("machine {id}")).await?.json().await?)
    }

    // ===== Settings =====

    pub async fn settings(&self) -> Result<Settings> {
        let response = self.client.get(self.url("/api/v1/settings")).send().await?;
        Ok(check(response, "settings").await?.json().await?)
    }

    pub async fn set_block_size(&self, mb: u64) -> Result<Settings> {
        let response = self
            .client
            .put(self.url("/api/v1/settings/block-size"))
            .json(&serde_json::json!({ "mb": mb }))
            .send()
            .await?;
        Ok(check(response, "settings").await?.json().await?)
    }
}

/// Turn non-success responses into errors
async fn check(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(format!("{}: {}", what, error_message(&body))));
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// The `error` field of a JSON error body, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// File name from `attachment; filename="..."`
fn attachment_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error":"No active machines available"}"#),
            "No active machines available"
        );
        assert_eq!(error_message("plain failure\n"), "plain failure");
        assert_eq!(error_message(r#"{"other":1}"#), r#"{"other":1}"#);
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("attachment; filename=\"report.pdf\""),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            attachment_filename("attachment; filename=plain.txt"),
            Some("plain.txt".to_string())
        );
        assert_eq!(
            attachment_filename("attachment; filename=\"../../etc/passwd\""),
            Some("passwd".to_string())
        );
        assert_eq!(attachment_filename("attachment"), None);
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = GatewayClient::new("http://gw:8080/").unwrap();
        assert_eq!(client.base_url(), "http://gw:8080");
        assert_eq!(client.url("/health"), "http://gw:8080/health");
    }

    #[test]
    fn test_file_details_deserialize() {
        let json = r#"{
            "file": {"id": 3, "original_name": "a.bin", "content_hash": "ab", "total_size": 10,
                     "block_count": 2, "block_size": 5, "status": "distributed",
                     "created_at": "2026-01-02T03:04:05Z"},
            "blocks": [{"id": 1, "file_id": 3, "block_number": 0, "content_hash": "cd", "size": 5,
                        "machine_url": "http://n:5001", "storage_path": "/s/ab_block_0",
                        "status": "stored", "created_at": "2026-01-02T03:04:05Z"}]
        }"#;
        let details: FileDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.file.id, 3);
        assert_eq!(details.blocks[0].machine_url, "http://n:5001");
    }
}
