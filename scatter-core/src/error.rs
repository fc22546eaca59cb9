//! Error types for scatter-core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, ScatterError>;

/// Errors raised by the block and hashing primitives
#[derive(Error, Debug)]
pub enum ScatterError {
    // ===== Block Errors =====
    #[error("Invalid block size: {0} (must be positive)")]
    InvalidBlockSize(u64),

    #[error("Validation error: {0}")]
    Validation(String),

    // ===== Hash Errors =====
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    // ===== I/O Errors =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScatterError::InvalidBlockSize(0);
        assert_eq!(err.to_string(), "Invalid block size: 0 (must be positive)");

        let err = ScatterError::HashMismatch {
            expected: "ab".into(),
            actual: "cd".into(),
        };
        assert_eq!(err.to_string(), "Hash mismatch: expected ab, got cd");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScatterError = io_err.into();
        assert!(matches!(err, ScatterError::Io(_)));
    }
}
