//! Scatter Catalog
//!
//! Persistent records for distributed files, their blocks, the registered
//! block nodes ("machines") and key/value settings.
//!
//! Two implementations of [`Catalog`] are provided:
//! - [`SqliteCatalog`]: sqlx connection pool over a SQLite database file
//! - [`MemoryCatalog`]: process-local tables behind a lock
//!
//! # Usage
//!
//! ```ignore
//! use scatter_catalog::{Catalog, SqliteCatalog, SqliteConfig};
//!
//! let catalog = SqliteCatalog::connect(&SqliteConfig::default()).await?;
//! let machines = catalog.list_active_machines().await?;
//! ```

pub mod catalog;
pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use memory::MemoryCatalog;
pub use models::*;
pub use sqlite::{SqliteCatalog, SqliteConfig};
