//! Catalog records
//!
//! These structs map directly to the SQLite tables in `migrations/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

pub type FileId = i64;
pub type BlockId = i64;
pub type MachineId = i64;

/// Status written on every block row
pub const BLOCK_STATUS_STORED: &str = "stored";

/// File status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Distributed,
    Deleted,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distributed => "distributed",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distributed" => Ok(Self::Distributed),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown file status: {}", other)),
        }
    }
}

/// A file whose blocks have all been placed on nodes
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub original_name: String,

    /// Hex SHA-256 of the whole file
    pub content_hash: String,

    // Size
    pub total_size: i64,
    pub block_count: i64,
    /// Block size used when this file was split
    pub block_size: i64,

    // Status
    pub status: String,

    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Parsed status; unknown values read as `Distributed`
    pub fn status(&self) -> FileStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn size_mb(&self) -> f64 {
        scatter_core::bytes_to_mb(self.total_size.max(0) as u64)
    }

    pub fn block_size_mb(&self) -> f64 {
        scatter_core::bytes_to_mb(self.block_size.max(0) as u64)
    }
}

/// Parameters for creating a new file
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub content_hash: String,
    pub total_size: i64,
    pub block_count: i64,
    pub block_size: i64,
}

/// Where one block of a file lives
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub file_id: FileId,

    // Position
    pub block_number: i64,

    /// Hex SHA-256 of this block's bytes
    pub content_hash: String,
    pub size: i64,

    // Location
    pub machine_url: String,
    pub storage_path: String,

    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a new block
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub file_id: FileId,
    pub block_number: i64,
    pub content_hash: String,
    pub size: i64,
    pub machine_url: String,
    pub storage_path: String,
}

/// A registered block node
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    /// Base address of the node's HTTP service
    pub url: String,
    /// Base directory for blocks on that node
    pub storage_path: String,
    pub is_active: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for registering a machine
#[derive(Debug, Clone)]
pub struct NewMachine {
    pub name: String,
    pub url: String,
    pub storage_path: String,
}

/// Replacement values for an existing machine
#[derive(Debug, Clone)]
pub struct MachineUpdate {
    pub name: String,
    pub url: String,
    pub storage_path: String,
}

/// Key/value setting
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
