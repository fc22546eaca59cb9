//! Reassembly engine
//!
//! Fetches a file's blocks in block-number order, checks each against its
//! recorded hash and appends it to the output. The whole-file hash is checked
//! once the last block is written. Fetches may run ahead of the writer, but
//! writes always happen in order.

use crate::error::{EngineError, EngineResult};
use crate::node_client::BlockTransport;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use scatter_catalog::{BlockRecord, Catalog, FileId, FileRecord};
use scatter_core::{ContentHash, ContentHasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A reassembled file written to local disk
#[derive(Debug, Clone)]
pub struct ReassembledFile {
    pub path: PathBuf,
    pub file: FileRecord,
    pub bytes_written: u64,
}

/// Rebuilds files from their distributed blocks
pub struct ReassemblyEngine {
    catalog: Arc<dyn Catalog>,
    transport: Arc<dyn BlockTransport>,
    concurrency: usize,
}

impl ReassemblyEngine {
    pub fn new(catalog: Arc<dyn Catalog>, transport: Arc<dyn BlockTransport>) -> Self {
        Self {
            catalog,
            transport,
            concurrency: 1,
        }
    }

    /// Number of block fetches allowed in flight; 1 is strictly sequential
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Reassemble a file into memory
    #[instrument(skip(self))]
    pub async fn reassemble(&self, file_id: FileId) -> EngineResult<Bytes> {
        let (file, blocks) = self.load(file_id).await?;
        let mut out = Vec::with_capacity(file.total_size.max(0) as usize);
        self.assemble(&file, &blocks, &mut out).await?;
        Ok(Bytes::from(out))
    }

    /// Reassemble a file into a fresh `{dir}/{id}_{uuid}.part`.
    ///
    /// Every call gets its own output path, so concurrent reassemblies of the
    /// same file never share an inode. On failure the partially written
    /// output is removed before the error is returned.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn reassemble_to(&self, file_id: FileId, dir: &Path) -> EngineResult<ReassembledFile> {
        let (file, blocks) = self.load(file_id).await?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}_{}.part", file.id, Uuid::new_v4()));
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let result = match self.assemble(&file, &blocks, &mut out).await {
            Ok(written) => out.flush().await.map(|_| written).map_err(EngineError::from),
            Err(e) => Err(e),
        };
        drop(out);

        match result {
            Ok(bytes_written) => {
                info!(file_id, path = %path.display(), bytes_written, "File reassembled");
                Ok(ReassembledFile {
                    path,
                    file,
                    bytes_written,
                })
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %rm, "Failed to remove truncated output");
                }
                Err(e)
            }
        }
    }

    async fn load(&self, file_id: FileId) -> EngineResult<(FileRecord, Vec<BlockRecord>)> {
        let file = self
            .catalog
            .get_file(file_id)
            .await?
            .ok_or(EngineError::FileNotFound(file_id))?;
        let blocks = self.catalog.list_blocks(file_id).await?;

        if blocks.is_empty() && file.block_count > 0 {
            return Err(EngineError::NoBlocksFound(file_id));
        }
        check_contiguous(&file, &blocks)?;
        Ok((file, blocks))
    }

    async fn assemble<W>(&self, file: &FileRecord, blocks: &[BlockRecord], out: &mut W) -> EngineResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let transport = Arc::clone(&self.transport);
        let mut fetched = stream::iter(blocks.to_vec())
            .map(move |block| {
                let transport = Arc::clone(&transport);
                async move {
                    let data = transport.fetch(&block.machine_url, &block.storage_path).await;
                    (block, data)
                }
            })
            .buffered(self.concurrency);

        let mut hasher = ContentHasher::new();
        while let Some((block, data)) = fetched.next().await {
            let number = block.block_number as u32;
            let data = data.ok_or(EngineError::FetchFailed(number))?;

            if !ContentHash::matches_hex(&data, &block.content_hash) {
                warn!(file_id = file.id, block = number, node = %block.machine_url, "Block hash mismatch");
                return Err(EngineError::IntegrityMismatch(number));
            }

            out.write_all(&data).await?;
            hasher.update(&data);
            debug!(file_id = file.id, block = number, size = data.len(), "Block appended");
        }

        let written = hasher.len();
        let actual = hasher.finalize().to_hex();
        if !actual.eq_ignore_ascii_case(&file.content_hash) {
            return Err(EngineError::FileHashMismatch {
                expected: file.content_hash.clone(),
                actual,
            });
        }
        Ok(written)
    }
}

/// Block rows must be numbered `0..block_count` with no gaps
fn check_contiguous(file: &FileRecord, blocks: &[BlockRecord]) -> EngineResult<()> {
    let expected = file.block_count.max(0) as u64;
    let contiguous = blocks
        .iter()
        .enumerate()
        .all(|(i, b)| b.block_number == i as i64);

    if blocks.len() as u64 != expected || !contiguous {
        return Err(EngineError::IncompleteBlockSet {
            expected,
            found: blocks.len() as u64,
        });
    }
    Ok(())
}
