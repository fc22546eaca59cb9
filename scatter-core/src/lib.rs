//! Scatter Core Library
//!
//! Primitives shared by every scatter component.
//! This crate provides:
//! - SHA-256 content hashing (whole files and individual blocks)
//! - Fixed-size block splitting and block-count arithmetic
//! - Deterministic placement (round-robin) and remote storage paths
//! - Block-size limits and common error handling

pub mod block;
pub mod error;
pub mod hash;
pub mod placement;

pub use block::{block_count, last_block_size, split_into_blocks, BlockSpec};
pub use error::{Result, ScatterError};
pub use hash::{ContentHash, ContentHasher};
pub use placement::{assign_round_robin, normalize_machine_url, storage_path};

/// Size constants
pub const MB: u64 = 1024 * 1024;
pub const DEFAULT_BLOCK_SIZE: u64 = 20 * MB; // 20 MB
pub const MAX_UPLOAD_SIZE: u64 = 500 * MB; // 500 MB

/// Bounds for user-facing block size input, in megabytes
pub const MIN_BLOCK_SIZE_MB: u64 = 1;
pub const MAX_BLOCK_SIZE_MB: u64 = 100;

/// Header carrying the shared node secret on write requests
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Settings key holding the block size (bytes) for new distributions
pub const BLOCK_SIZE_SETTING: &str = "block_size";

/// Convert a user-supplied block size in megabytes to bytes.
///
/// Accepts `MIN_BLOCK_SIZE_MB..=MAX_BLOCK_SIZE_MB`.
pub fn block_size_from_mb(mb: u64) -> Result<u64> {
    if !(MIN_BLOCK_SIZE_MB..=MAX_BLOCK_SIZE_MB).contains(&mb) {
        return Err(ScatterError::Validation(format!(
            "Block size must be between {} and {} MB, got {}",
            MIN_BLOCK_SIZE_MB, MAX_BLOCK_SIZE_MB, mb
        )));
    }
    Ok(mb * MB)
}

/// Bytes to megabytes, rounded to two decimals for display
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / MB as f64 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_from_mb_bounds() {
        assert_eq!(block_size_from_mb(1).unwrap(), MB);
        assert_eq!(block_size_from_mb(20).unwrap(), DEFAULT_BLOCK_SIZE);
        assert_eq!(block_size_from_mb(100).unwrap(), 100 * MB);

        assert!(matches!(
            block_size_from_mb(0),
            Err(ScatterError::Validation(_))
        ));
        assert!(matches!(
            block_size_from_mb(101),
            Err(ScatterError::Validation(_))
        ));
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(DEFAULT_BLOCK_SIZE), 20.0);
        assert_eq!(bytes_to_mb(1536 * 1024), 1.5);
        assert_eq!(bytes_to_mb(0), 0.0);
    }
}
