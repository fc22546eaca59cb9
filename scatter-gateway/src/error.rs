//! Error types for distribution, reassembly, deletion and registry operations

use scatter_catalog::{CatalogError, FileId, MachineId};
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Outcome of a failed engine operation.
///
/// Block-level failures carry the offending block number.
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== Input Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    // ===== Placement Errors =====
    #[error("No active machines available")]
    NoActiveMachines,

    #[error("Failed to send block {0}")]
    TransferFailed(u32),

    // ===== Retrieval Errors =====
    #[error("Failed to download block {0}")]
    FetchFailed(u32),

    #[error("Integrity error for block {0}")]
    IntegrityMismatch(u32),

    #[error("Reassembled file hash mismatch: expected {expected}, got {actual}")]
    FileHashMismatch { expected: String, actual: String },

    #[error("Incomplete block set: expected {expected} blocks, found {found}")]
    IncompleteBlockSet { expected: u64, found: u64 },

    // ===== Lookup Errors =====
    #[error("File {0} not found")]
    FileNotFound(FileId),

    #[error("No blocks found for file {0}")]
    NoBlocksFound(FileId),

    #[error("Machine {0} not found")]
    MachineNotFound(MachineId),

    // ===== Infrastructure Errors =====
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<scatter_core::ScatterError> for EngineError {
    fn from(err: scatter_core::ScatterError) -> Self {
        match err {
            scatter_core::ScatterError::Io(e) => EngineError::Io(e),
            other => EngineError::Validation(other.to_string()),
        }
    }
}

impl EngineError {
    /// Block number for block-level failures
    pub fn block_number(&self) -> Option<u32> {
        match self {
            EngineError::TransferFailed(n)
            | EngineError::FetchFailed(n)
            | EngineError::IntegrityMismatch(n) => Some(*n),
            _ => None,
        }
    }
}
