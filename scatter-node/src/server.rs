//! Block node HTTP protocol
//!
//! - `POST /upload_block`: multipart `block` + `path`, `X-API-KEY` required
//! - `GET /download_block?path=`: raw block bytes as an attachment
//! - `DELETE /delete_block?path=`: remove a block, `X-API-KEY` required
//! - `GET /status`: unauthenticated liveness probe
//! - `GET /metrics`: Prometheus text format, when enabled

use crate::metrics::NodeMetrics;
use crate::store::{attachment_name, BlockStore, StoreError};
use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, FromRequest,
        Multipart, Query, Request, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use scatter_core::API_KEY_HEADER;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

/// Node API error types
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing block or path")]
    MissingField,

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Malformed upload: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = match &self {
            NodeError::Unauthorized => StatusCode::FORBIDDEN,
            NodeError::MissingField => StatusCode::BAD_REQUEST,
            NodeError::Multipart(e) => e.status(),
            NodeError::NotMultipart(e) => e.status(),
            NodeError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            NodeError::Store(StoreError::InvalidPath(_) | StoreError::OutsideRoot) => {
                StatusCode::BAD_REQUEST
            }
            NodeError::Store(StoreError::Io(_)) | NodeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type NodeResult<T> = Result<T, NodeError>;

/// Shared state for node handlers
pub struct NodeState {
    store: BlockStore,
    api_key: String,
    metrics: Option<PrometheusHandle>,
}

impl NodeState {
    pub fn new(store: BlockStore, api_key: impl Into<String>) -> Self {
        Self {
            store,
            api_key: api_key.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Reject the request unless it carries the configured key
    fn authorize(&self, headers: &HeaderMap) -> NodeResult<()> {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        match presented {
            Some(key) if !self.api_key.is_empty() && key == self.api_key => Ok(()),
            _ => {
                NodeMetrics::record_auth_rejected();
                Err(NodeError::Unauthorized)
            }
        }
    }
}

/// Build the node router
pub fn router(state: Arc<NodeState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/upload_block", post(upload_block))
        .route("/download_block", get(download_block))
        .route("/delete_block", delete(delete_block))
        .route("/status", get(status))
        .route("/metrics", get(render_metrics))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

/// POST /upload_block
#[instrument(skip_all)]
async fn upload_block(
    State(state): State<Arc<NodeState>>,
    request: Request,
) -> NodeResult<impl IntoResponse> {
    // Nothing is read from the body until the key checks out
    state.authorize(request.headers()).inspect_err(|_| {
        warn!("Upload rejected: bad or missing API key");
    })?;
    let mut multipart = Multipart::from_request(request, &state).await?;

    let mut block = None;
    let mut path = None;
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("block") => block = Some(field.bytes().await?),
            Some("path") => path = Some(field.text().await?),
            _ => {}
        }
    }

    let (Some(block), Some(path)) = (block, path.filter(|p| !p.is_empty())) else {
        warn!("Upload missing block or path");
        return Err(NodeError::MissingField);
    };

    let stored = state.store.write(&path, &block).await.inspect_err(|e| {
        if matches!(e, StoreError::Io(_)) {
            NodeMetrics::record_storage_error();
        }
        warn!(path = %path, error = %e, "Failed to store block");
    })?;

    NodeMetrics::record_store(block.len());
    info!(path = %stored.display(), size = block.len(), "Block stored");
    Ok(Json(json!({ "status": "stored" })))
}

/// GET /download_block?path=
#[instrument(skip(state))]
async fn download_block(
    State(state): State<Arc<NodeState>>,
    Query(query): Query<PathQuery>,
) -> NodeResult<Response> {
    let path = query.path.unwrap_or_default();

    let (file, len) = match state.store.open(&path).await {
        Ok(opened) => opened,
        Err(StoreError::InvalidPath(_)) => {
            NodeMetrics::record_missing();
            return Err(StoreError::NotFound.into());
        }
        Err(e) => {
            if matches!(e, StoreError::NotFound) {
                NodeMetrics::record_missing();
            }
            warn!(path = %path, error = %e, "Block not served");
            return Err(e.into());
        }
    };

    NodeMetrics::record_serve(len);
    info!(path = %path, size = len, "Serving block");

    let filename = attachment_name(&path).replace('"', "_");
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| NodeError::Internal(e.to_string()))
}

/// DELETE /delete_block?path=
#[instrument(skip(state, headers))]
async fn delete_block(
    State(state): State<Arc<NodeState>>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> NodeResult<impl IntoResponse> {
    state.authorize(&headers)?;

    let path = query.path.unwrap_or_default();
    match state.store.delete(&path).await {
        Ok(()) => {
            NodeMetrics::record_delete();
            info!(path = %path, "Block deleted");
            Ok(Json(json!({ "status": "deleted" })))
        }
        Err(StoreError::NotFound | StoreError::InvalidPath(_)) => {
            NodeMetrics::record_missing();
            Err(StoreError::NotFound.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /status
async fn status() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /metrics
async fn render_metrics(State(state): State<Arc<NodeState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const KEY: &str = "test-key";
    const BOUNDARY: &str = "scatter-test-boundary";

    fn app(store: BlockStore) -> Router {
        router(Arc::new(NodeState::new(store, KEY)), 1024 * 1024)
    }

    fn multipart_body(block: Option<&[u8]>, path: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(block) = block {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"block\"; filename=\"block\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(block);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(path) = path {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n{path}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(key: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload_block")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blocks/abc_block_0");
        let path = path.to_str().unwrap();

        let response = app(BlockStore::unconfined())
            .oneshot(upload_request(Some(KEY), multipart_body(Some(b"payload"), Some(path))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "stored");

        let response = app(BlockStore::unconfined())
            .oneshot(
                Request::get(format!("/download_block?path={path}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(disposition, "attachment; filename=\"abc_block_0\"");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"payload");
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_key_before_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never_written");

        for key in [None, Some("wrong-key")] {
            let response = app(BlockStore::unconfined())
                .oneshot(upload_request(
                    key,
                    multipart_body(Some(b"x"), Some(path.to_str().unwrap())),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(json_body(response).await["error"], "Unauthorized");
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_keyless_non_multipart_upload_is_forbidden() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload_block")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("not a form"))
            .unwrap();
        let response = app(BlockStore::unconfined()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::builder()
            .method("POST")
            .uri("/upload_block")
            .header(API_KEY_HEADER, KEY)
            .body(Body::from("not a form"))
            .unwrap();
        let response = app(BlockStore::unconfined()).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
        assert_ne!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_upload_missing_fields() {
        let response = app(BlockStore::unconfined())
            .oneshot(upload_request(Some(KEY), multipart_body(Some(b"x"), None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(BlockStore::unconfined())
            .oneshot(upload_request(Some(KEY), multipart_body(None, Some("/tmp/x"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing block or path");
    }

    #[tokio::test]
    async fn test_upload_outside_root_rejected() {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::confined(dir.path());

        let response = app(store)
            .oneshot(upload_request(
                Some(KEY),
                multipart_body(Some(b"x"), Some("/etc/scatter_block_0")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Path outside storage root");
    }

    #[tokio::test]
    async fn test_download_missing_block() {
        for uri in ["/download_block?path=/nonexistent/scatter", "/download_block"] {
            let response = app(BlockStore::unconfined())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(json_body(response).await["error"], "Block not found");
        }
    }

    #[tokio::test]
    async fn test_delete_block() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc_block_2");
        std::fs::write(&path, b"data").unwrap();
        let uri = format!("/delete_block?path={}", path.to_str().unwrap());

        let response = app(BlockStore::unconfined())
            .oneshot(Request::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(path.exists());

        let response = app(BlockStore::unconfined())
            .oneshot(
                Request::delete(&uri)
                    .header(API_KEY_HEADER, KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!path.exists());

        let response = app(BlockStore::unconfined())
            .oneshot(
                Request::delete(&uri)
                    .header(API_KEY_HEADER, KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_and_metrics_disabled() {
        let response = app(BlockStore::unconfined())
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");

        let response = app(BlockStore::unconfined())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
