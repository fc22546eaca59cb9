//! JSON HTTP API
//!
//! Files, machines and settings under `/api/v1`. Every error body is
//! `{"error": "<message>"}`.

use crate::error::EngineError;
use crate::sanitize_filename;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use scatter_catalog::{BlockRecord, CatalogError, FileId, FileRecord, FileStatus, MachineId};
use scatter_core::{bytes_to_mb, MAX_UPLOAD_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// ERRORS
// =============================================================================

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Upload error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Engine(e) => match e {
                EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                EngineError::NoActiveMachines => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::TransferFailed(_)
                | EngineError::FetchFailed(_)
                | EngineError::IntegrityMismatch(_)
                | EngineError::FileHashMismatch { .. }
                | EngineError::IncompleteBlockSet { .. } => StatusCode::BAD_GATEWAY,
                EngineError::FileNotFound(_)
                | EngineError::NoBlocksFound(_)
                | EngineError::MachineNotFound(_)
                | EngineError::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
                EngineError::Catalog(CatalogError::Duplicate(_)) => StatusCode::CONFLICT,
                EngineError::Catalog(CatalogError::Invalid(_)) => StatusCode::BAD_REQUEST,
                EngineError::Catalog(_) | EngineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = %status, error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =============================================================================
// ROUTES
// =============================================================================

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE as usize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Files
        .route("/api/v1/files", get(list_files).post(upload_file))
        .route("/api/v1/files/:id", get(get_file).delete(delete_file))
        .route("/api/v1/files/:id/download", get(download_file))
        // Machines
        .route("/api/v1/machines", get(list_machines).post(create_machine))
        .route(
            "/api/v1/machines/:id",
            put(update_machine).delete(delete_machine),
        )
        .route("/api/v1/machines/:id/toggle", post(toggle_machine))
        .route("/api/v1/machines/:id/status", get(machine_status))
        // Settings
        .route("/api/v1/settings", get(get_settings))
        .route("/api/v1/settings/block-size", put(set_block_size))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// =============================================================================
// FILES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
}

/// A file with its block placements
#[derive(Debug, Serialize, Deserialize)]
pub struct FileDetails {
    pub file: FileRecord,
    pub blocks: Vec<BlockRecord>,
}

/// POST /api/v1/files - Upload and distribute a file
#[instrument(skip(state, multipart))]
async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut staged: Option<(PathBuf, String)> = None;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("No selected file".to_string()));
        }

        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        let path = state.config.upload_dir.join(Uuid::new_v4().to_string());
        let mut out = tokio::fs::File::create(&path).await?;

        let written = async {
            while let Some(chunk) = field.chunk().await? {
                out.write_all(&chunk).await?;
            }
            out.flush().await?;
            Ok::<_, ApiError>(())
        }
        .await;
        drop(out);

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
        staged = Some((path, sanitize_filename(&name)));
        break;
    }

    let (path, name) = staged.ok_or_else(|| ApiError::BadRequest("No file part".to_string()))?;
    let block_size = match state.settings.block_size().await {
        Ok(size) => size,
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
    };

    info!(name = %name, block_size, "Distributing upload");
    let receipt = state
        .distribution
        .distribute_staged(&path, &name, block_size)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FileDetails {
            file: receipt.file,
            blocks: receipt.blocks,
        }),
    ))
}

/// GET /api/v1/files - List files, newest first
async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<FileRecord>>> {
    let files = match query.status.as_deref() {
        None | Some("") => state.catalog.list_files().await,
        Some(raw) => {
            let status: FileStatus = raw.parse().map_err(ApiError::BadRequest)?;
            state.catalog.list_files_by_status(status).await
        }
    }
    .map_err(EngineError::from)?;
    Ok(Json(files))
}

/// GET /api/v1/files/:id - File record and its blocks
async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FileId>,
) -> ApiResult<Json<FileDetails>> {
    let file = state
        .catalog
        .get_file(id)
        .await
        .map_err(EngineError::from)?
        .ok_or(EngineError::FileNotFound(id))?;
    let blocks = state
        .catalog
        .list_blocks(id)
        .await
        .map_err(EngineError::from)?;
    Ok(Json(FileDetails { file, blocks }))
}

/// GET /api/v1/files/:id/download - Reassemble and stream a file
#[instrument(skip(state))]
async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FileId>,
) -> ApiResult<Response> {
    let assembled = state
        .reassembly
        .reassemble_to(id, &state.config.download_dir)
        .await?;

    let file = tokio::fs::File::open(&assembled.path).await?;
    // The open handle keeps the data readable on unix
    if let Err(e) = tokio::fs::remove_file(&assembled.path).await {
        debug!(path = %assembled.path.display(), error = %e, "Reassembled file left in place");
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&assembled.file.original_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, assembled.bytes_written.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// DELETE /api/v1/files/:id
async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FileId>,
) -> ApiResult<impl IntoResponse> {
    let report = state.delete_file(id).await?;
    Ok(Json(report))
}

// =============================================================================
// MACHINES
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MachineRequest {
    pub name: String,
    pub url: String,
    pub storage_path: String,
}

async fn list_machines(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.registry.list().await?))
}

async fn create_machine(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MachineRequest>,
) -> ApiResult<impl IntoResponse> {
    let machine = state
        .registry
        .add(&req.name, &req.url, &req.storage_path)
        .await?;
    Ok((StatusCode::CREATED, Json(machine)))
}

async fn update_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineId>,
    Json(req): Json<MachineRequest>,
) -> ApiResult<impl IntoResponse> {
    let machine = state
        .registry
        .update(id, &req.name, &req.url, &req.storage_path)
        .await?;
    Ok(Json(machine))
}

async fn delete_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineId>,
) -> ApiResult<StatusCode> {
    state.registry.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.registry.toggle(id).await?))
}

async fn machine_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MachineId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.registry.check_status(id).await?))
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub block_size: u64,
    pub block_size_mb: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockSizeRequest {
    pub mb: u64,
}

async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<SettingsResponse>> {
    let block_size = state.settings.block_size().await?;
    Ok(Json(SettingsResponse {
        block_size,
        block_size_mb: bytes_to_mb(block_size),
    }))
}

async fn set_block_size(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BlockSizeRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let block_size = state.settings.set_block_size_mb(req.mb).await?;
    Ok(Json(SettingsResponse {
        block_size,
        block_size_mb: bytes_to_mb(block_size),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_client::TransferConfig;
    use crate::state::GatewayConfig;
    use crate::testing::MockTransport;
    use axum::body::to_bytes;
    use axum::http::Request;
    use scatter_catalog::{Catalog, MemoryCatalog, NewMachine};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "scatter-test-boundary";

    struct Harness {
        app: Router,
        catalog: Arc<MemoryCatalog>,
        transport: Arc<MockTransport>,
        dir: TempDir,
    }

    async fn harness(machines: usize) -> Harness {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        for i in 0..machines {
            catalog
                .insert_machine(NewMachine {
                    name: format!("node-{i}"),
                    url: format!("http://node-{i}:5001"),
                    storage_path: "/blocks".into(),
                })
                .await
                .unwrap();
        }
        let transport = Arc::new(MockTransport::new());
        let config = GatewayConfig {
            upload_dir: dir.path().join("uploads"),
            download_dir: dir.path().join("downloads"),
            transfer: TransferConfig::with_api_key("k"),
            transfer_concurrency: 2,
        };
        let state = Arc::new(AppState::new(config, catalog.clone(), transport.clone()));
        Harness {
            app: router(state),
            catalog,
            transport,
            dir,
        }
    }

    fn upload_request(file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/v1/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_download_delete() {
        let h = harness(2).await;
        h.catalog
            .set_setting(scatter_core::BLOCK_SIZE_SETTING, "4")
            .await
            .unwrap();
        let data = b"hello distributed world";

        let response = h
            .app
            .clone()
            .oneshot(upload_request("greeting.txt", data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let id = body["file"]["id"].as_i64().unwrap();
        assert_eq!(body["file"]["block_count"], 6);
        assert_eq!(body["blocks"].as_array().unwrap().len(), 6);

        // Staged upload released
        let staged: Vec<_> = std::fs::read_dir(h.dir.path().join("uploads"))
            .unwrap()
            .collect();
        assert!(staged.is_empty());

        let response = h
            .app
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/files/{id}/download"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"greeting.txt\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], data);

        let response = h
            .app
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/files/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["blocks_removed"], 6);
        assert_eq!(h.transport.block_count(), 0);

        let response = h
            .app
            .oneshot(
                Request::get(format!("/api/v1/files/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Serve one request on a spawned task, the way the server does
    async fn spawned(app: &Router, request: Request<Body>) -> Response {
        tokio::spawn(app.clone().oneshot(request))
            .await
            .unwrap()
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_every_route_is_served() {
        let h = harness(1).await;
        let app = &h.app;

        let response = spawned(app, empty_request("GET", "/health")).await;
        assert_eq!(json_body(response).await["status"], "ok");

        let response = spawned(app, upload_request("r.bin", b"route sweep")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["file"]["id"].as_i64().unwrap();

        let response = spawned(app, empty_request("GET", "/api/v1/files")).await;
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

        let response = spawned(app, empty_request("GET", &format!("/api/v1/files/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = spawned(
            app,
            empty_request("GET", &format!("/api/v1/files/{id}/download")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"route sweep");

        let response = spawned(app, empty_request("DELETE", &format!("/api/v1/files/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = spawned(app, empty_request("GET", "/api/v1/machines")).await;
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

        let response = spawned(
            app,
            json_request(
                "POST",
                "/api/v1/machines",
                json!({ "name": "beta", "url": "10.0.0.9:5001", "storage_path": "/b" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let mid = json_body(response).await["id"].as_i64().unwrap();

        let response = spawned(
            app,
            json_request(
                "PUT",
                &format!("/api/v1/machines/{mid}"),
                json!({ "name": "beta-2", "url": "http://10.0.0.9:5001", "storage_path": "/b2" }),
            ),
        )
        .await;
        assert_eq!(json_body(response).await["name"], "beta-2");

        let response = spawned(
            app,
            empty_request("POST", &format!("/api/v1/machines/{mid}/toggle")),
        )
        .await;
        assert_eq!(json_body(response).await["is_active"], false);

        let response = spawned(
            app,
            empty_request("GET", &format!("/api/v1/machines/{mid}/status")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = spawned(app, empty_request("DELETE", &format!("/api/v1/machines/{mid}"))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = spawned(app, empty_request("GET", "/api/v1/settings")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = spawned(
            app,
            json_request("PUT", "/api/v1/settings/block-size", json!({ "mb": 2 })),
        )
        .await;
        assert_eq!(json_body(response).await["block_size"], 2 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_download_leaves_no_reassembled_files() {
        let h = harness(2).await;
        h.catalog
            .set_setting(scatter_core::BLOCK_SIZE_SETTING, "3")
            .await
            .unwrap();
        let response = spawned(&h.app, upload_request("twice.bin", b"downloaded twice")).await;
        let id = json_body(response).await["file"]["id"].as_i64().unwrap();
        let uri = format!("/api/v1/files/{id}/download");

        let (a, b) = tokio::join!(
            spawned(&h.app, empty_request("GET", &uri)),
            spawned(&h.app, empty_request("GET", &uri))
        );
        for response in [a, b] {
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], b"downloaded twice");
        }
        let left = std::fs::read_dir(h.dir.path().join("downloads")).unwrap().count();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn test_upload_without_machines() {
        let h = harness(0).await;
        let response = h
            .app
            .oneshot(upload_request("a.txt", b"abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await["error"],
            "No active machines available"
        );
        assert_eq!(h.catalog.file_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_with_empty_filename() {
        let h = harness(1).await;
        let response = h.app.oneshot(upload_request("", b"abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_corrupted_download_is_bad_gateway() {
        let h = harness(1).await;
        h.catalog
            .set_setting(scatter_core::BLOCK_SIZE_SETTING, "2")
            .await
            .unwrap();
        let response = h
            .app
            .clone()
            .oneshot(upload_request("c.bin", b"abcdef"))
            .await
            .unwrap();
        let id = json_body(response).await["file"]["id"].as_i64().unwrap();

        let block = &h.catalog.list_blocks(id).await.unwrap()[1];
        h.transport.corrupt(&block.machine_url, &block.storage_path);

        let response = h
            .app
            .oneshot(
                Request::get(format!("/api/v1/files/{id}/download"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(response).await["error"],
            "Integrity error for block 1"
        );
    }

    #[tokio::test]
    async fn test_machine_endpoints() {
        let h = harness(0).await;
        let create = |name: &str| {
            Request::post("/api/v1/machines")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "name": name, "url": "10.0.0.5:5001", "storage_path": "/srv" })
                        .to_string(),
                ))
                .unwrap()
        };

        let response = h.app.clone().oneshot(create("alpha")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let machine = json_body(response).await;
        assert_eq!(machine["url"], "http://10.0.0.5:5001");
        let id = machine["id"].as_i64().unwrap();

        let response = h.app.clone().oneshot(create("alpha")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = h
            .app
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/machines/{id}/toggle"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(response).await["is_active"], false);

        let response = h
            .app
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/machines/{id}/status"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(response).await["online"], true);

        let response = h
            .app
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/machines/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = h
            .app
            .oneshot(
                Request::delete(format!("/api/v1/machines/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_endpoints() {
        let h = harness(0).await;
        let response = h
            .app
            .clone()
            .oneshot(Request::get("/api/v1/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["block_size_mb"], 20.0);

        let put = |mb: u64| {
            Request::put("/api/v1/settings/block-size")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "mb": mb }).to_string()))
                .unwrap()
        };
        let response = h.app.clone().oneshot(put(8)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["block_size"], 8 * 1024 * 1024);

        let response = h.app.oneshot(put(0)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_files_status_filter() {
        let h = harness(0).await;
        let response = h
            .app
            .clone()
            .oneshot(
                Request::get("/api/v1/files?status=distributed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = h
            .app
            .oneshot(
                Request::get("/api/v1/files?status=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
