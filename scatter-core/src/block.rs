//! Fixed-size block splitting
//!
//! A file of `total_size` bytes split with `block_size` produces
//! `ceil(total_size / block_size)` blocks numbered from 0 in file order.
//! Every block is exactly `block_size` bytes except possibly the last.

use crate::error::{Result, ScatterError};
use crate::hash::ContentHash;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Position and digest of one block within its file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// 0-based block number
    pub number: u32,

    /// Byte offset of the block in the original file
    pub offset: u64,

    /// Block length in bytes
    pub size: u64,

    /// SHA-256 of this block's bytes only
    pub hash: ContentHash,
}

impl BlockSpec {
    /// Byte range of this block in the original file
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }

    /// Slice this block's payload out of the whole file without copying
    pub fn slice(&self, file: &Bytes) -> Bytes {
        file.slice(self.range())
    }
}

/// Number of blocks needed for `total_size` bytes
pub fn block_count(total_size: u64, block_size: u64) -> Result<u64> {
    if block_size == 0 {
        return Err(ScatterError::InvalidBlockSize(block_size));
    }
    Ok(total_size.div_ceil(block_size))
}

/// Size of the final block; `block_size` when it divides evenly, 0 for empty input
pub fn last_block_size(total_size: u64, block_size: u64) -> Result<u64> {
    if block_size == 0 {
        return Err(ScatterError::InvalidBlockSize(block_size));
    }
    if total_size == 0 {
        return Ok(0);
    }
    match total_size % block_size {
        0 => Ok(block_size),
        rem => Ok(rem),
    }
}

/// Split `data` into blocks of `block_size` and hash each one.
///
/// Empty input yields no blocks.
pub fn split_into_blocks(data: &[u8], block_size: u64) -> Result<Vec<BlockSpec>> {
    if block_size == 0 {
        return Err(ScatterError::InvalidBlockSize(block_size));
    }
    let chunk_len = usize::try_from(block_size).unwrap_or(usize::MAX);

    let blocks = data
        .chunks(chunk_len)
        .enumerate()
        .map(|(number, bytes)| BlockSpec {
            number: number as u32,
            offset: number as u64 * block_size,
            size: bytes.len() as u64,
            hash: ContentHash::compute(bytes),
        })
        .collect();

    Ok(blocks)
}
