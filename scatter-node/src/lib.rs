//! Scatter Block Node Library
//!
//! A minimal HTTP service that stores, serves and deletes opaque byte
//! blocks at caller-specified paths:
//! - Configuration management (TOML, CLI and environment overrides)
//! - Filesystem block store with optional root confinement
//! - axum handlers for the block protocol
//! - Prometheus metrics

pub mod config;
pub mod metrics;
pub mod server;
pub mod store;

pub use config::{
    AuthSettings, ConfigError, MetricsSettings, NodeConfig, ServerSettings, StorageSettings,
};
pub use metrics::{init_metrics, NodeMetrics};
pub use server::{router, NodeError, NodeResult, NodeState};
pub use store::{BlockStore, StoreError};
