//! Distribution engine
//!
//! Splits a file into fixed-size blocks, places block `i` on active machine
//! `i mod M`, and pushes every block to its node. Catalog rows are written
//! only once every transfer has succeeded; if writing them fails part way,
//! the rows written so far are removed again.

use crate::error::{EngineError, EngineResult};
use crate::node_client::BlockTransport;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use scatter_catalog::{BlockRecord, Catalog, FileId, FileRecord, Machine, NewBlock, NewFile};
use scatter_core::{assign_round_robin, split_into_blocks, storage_path, BlockSpec, ContentHash};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// A block with its target node and remote path
#[derive(Debug, Clone)]
pub struct PlannedBlock {
    pub spec: BlockSpec,
    pub machine_url: String,
    pub storage_path: String,
}

/// Result of a committed distribution
#[derive(Debug, Clone)]
pub struct DistributionReceipt {
    pub file: FileRecord,
    pub blocks: Vec<BlockRecord>,
}

impl DistributionReceipt {
    pub fn file_id(&self) -> FileId {
        self.file.id
    }
}

/// Place blocks on machines round-robin
pub fn plan_placement(
    blocks: Vec<BlockSpec>,
    machines: &[Machine],
    file_hash: &str,
) -> EngineResult<Vec<PlannedBlock>> {
    if machines.is_empty() {
        return Err(EngineError::NoActiveMachines);
    }
    Ok(blocks
        .into_iter()
        .map(|spec| {
            let machine = &machines[assign_round_robin(spec.number, machines.len())];
            PlannedBlock {
                storage_path: storage_path(&machine.storage_path, file_hash, spec.number),
                machine_url: machine.url.clone(),
                spec,
            }
        })
        .collect())
}

/// Splits, places and commits files
pub struct DistributionEngine {
    catalog: Arc<dyn Catalog>,
    transport: Arc<dyn BlockTransport>,
    concurrency: usize,
}

impl DistributionEngine {
    pub fn new(catalog: Arc<dyn Catalog>, transport: Arc<dyn BlockTransport>) -> Self {
        Self {
            catalog,
            transport,
            concurrency: 1,
        }
    }

    /// Number of block transfers allowed in flight; 1 is strictly sequential
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Distribute `data` under `original_name` using `block_size` bytes per block
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn distribute(
        &self,
        data: Bytes,
        original_name: &str,
        block_size: u64,
    ) -> EngineResult<DistributionReceipt> {
        let original_name = original_name.trim();
        if original_name.is_empty() {
            return Err(EngineError::Validation("No selected file".to_string()));
        }
        if block_size == 0 {
            return Err(EngineError::Validation(
                "Block size must be positive".to_string(),
            ));
        }

        let file_hash = ContentHash::compute(&data).to_hex();
        let blocks = split_into_blocks(&data, block_size)?;
        let block_count = blocks.len();

        let machines = self.catalog.list_active_machines().await?;
        let plan = plan_placement(blocks, &machines, &file_hash)?;
        debug!(
            hash = %file_hash,
            blocks = block_count,
            machines = machines.len(),
            "Placement planned"
        );

        self.transfer_all(&data, &plan).await?;

        let receipt = self
            .commit(original_name, &file_hash, data.len() as u64, block_size, &plan)
            .await?;

        info!(
            file_id = receipt.file.id,
            name = %original_name,
            hash = %file_hash,
            blocks = block_count,
            "File distributed"
        );
        Ok(receipt)
    }

    /// Distribute a file staged on local disk, then remove the staged copy.
    ///
    /// The staged file is removed whether or not distribution succeeds.
    pub async fn distribute_staged(
        &self,
        staged: &Path,
        original_name: &str,
        block_size: u64,
    ) -> EngineResult<DistributionReceipt> {
        let result = match tokio::fs::read(staged).await {
            Ok(data) => {
                self.distribute(Bytes::from(data), original_name, block_size)
                    .await
            }
            Err(e) => Err(EngineError::Io(e)),
        };

        if let Err(e) = tokio::fs::remove_file(staged).await {
            warn!(path = %staged.display(), error = %e, "Failed to release staged upload");
        }
        result
    }

    /// Push every block; the lowest-numbered failure is reported
    async fn transfer_all(&self, data: &Bytes, plan: &[PlannedBlock]) -> EngineResult<()> {
        let transport = Arc::clone(&self.transport);
        let data = data.clone();
        let mut transfers = stream::iter(plan.to_vec())
            .map(move |block| {
                let transport = Arc::clone(&transport);
                let payload = block.spec.slice(&data);
                async move {
                    let ok = transport
                        .store(payload, &block.machine_url, &block.storage_path)
                        .await;
                    (block.spec.number, ok)
                }
            })
            .buffered(self.concurrency);

        while let Some((number, ok)) = transfers.next().await {
            if !ok {
                warn!(block = number, "Block transfer failed, abandoning distribution");
                return Err(EngineError::TransferFailed(number));
            }
        }
        Ok(())
    }

    async fn commit(
        &self,
        original_name: &str,
        file_hash: &str,
        total_size: u64,
        block_size: u64,
        plan: &[PlannedBlock],
    ) -> EngineResult<DistributionReceipt> {
        let file = self
            .catalog
            .insert_file(NewFile {
                original_name: original_name.to_string(),
                content_hash: file_hash.to_string(),
                total_size: total_size as i64,
                block_count: plan.len() as i64,
                block_size: block_size as i64,
            })
            .await?;

        let mut blocks = Vec::with_capacity(plan.len());
        for block in plan {
            let inserted = self
                .catalog
                .insert_block(NewBlock {
                    file_id: file.id,
                    block_number: block.spec.number as i64,
                    content_hash: block.spec.hash.to_hex(),
                    size: block.spec.size as i64,
                    machine_url: block.machine_url.clone(),
                    storage_path: block.storage_path.clone(),
                })
                .await;

            match inserted {
                Ok(record) => blocks.push(record),
                Err(e) => {
                    error!(file_id = file.id, block = block.spec.number, error = %e, "Block record insert failed, rolling back");
                    self.rollback(file.id).await;
                    return Err(e.into());
                }
            }
        }

        Ok(DistributionReceipt { file, blocks })
    }

    async fn rollback(&self, file_id: FileId) {
        if let Err(e) = self.catalog.delete_blocks(file_id).await {
            error!(file_id, error = %e, "Rollback of block records failed");
        }
        if let Err(e) = self.catalog.delete_file(file_id).await {
            error!(file_id, error = %e, "Rollback of file record failed");
        }
    }
}
