//! File deletion
//!
//! Remote block deletes are best effort. Catalog rows are removed regardless
//! of whether any node answered.

use crate::error::{EngineError, EngineResult};
use crate::node_client::BlockTransport;
use futures::stream::{self, StreamExt};
use scatter_catalog::{Catalog, FileId};
use serde::Serialize;
use tracing::{info, instrument};

/// What a deletion removed from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub file_id: FileId,
    pub blocks_removed: u64,
}

/// Delete a file, its block rows, and (best effort) its remote blocks
#[instrument(skip(catalog, transport))]
pub async fn delete_file(
    catalog: &dyn Catalog,
    transport: &dyn BlockTransport,
    file_id: FileId,
    concurrency: usize,
) -> EngineResult<DeletionReport> {
    if catalog.get_file(file_id).await?.is_none() {
        return Err(EngineError::FileNotFound(file_id));
    }

    let blocks = catalog.list_blocks(file_id).await?;
    stream::iter(blocks.iter())
        .for_each_concurrent(concurrency.max(1), |block| {
            transport.delete_best_effort(&block.machine_url, &block.storage_path)
        })
        .await;

    let blocks_removed = catalog.delete_blocks(file_id).await?;
    catalog.delete_file(file_id).await?;

    info!(file_id, blocks_removed, "File deleted");
    Ok(DeletionReport {
        file_id,
        blocks_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionEngine;
    use crate::testing::MockTransport;
    use bytes::Bytes;
    use scatter_catalog::{MemoryCatalog, NewMachine};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    async fn distributed_file(
        catalog: &Arc<MemoryCatalog>,
        transport: &Arc<MockTransport>,
    ) -> FileId {
        for i in 0..2 {
            catalog
                .insert_machine(NewMachine {
                    name: format!("node-{i}"),
                    url: format!("http://node-{i}:5001"),
                    storage_path: "/blocks".into(),
                })
                .await
                .unwrap();
        }
        DistributionEngine::new(catalog.clone(), transport.clone())
            .distribute(Bytes::from(vec![3u8; 50]), "f.bin", 10)
            .await
            .unwrap()
            .file_id()
    }

    #[tokio::test]
    async fn test_delete_removes_rows_and_remote_blocks() {
        let catalog = Arc::new(MemoryCatalog::new());
        let transport = Arc::new(MockTransport::new());
        let id = distributed_file(&catalog, &transport).await;
        assert_eq!(transport.block_count(), 5);

        let report = delete_file(catalog.as_ref(), transport.as_ref(), id, 1)
            .await
            .unwrap();

        assert_eq!(report, DeletionReport { file_id: id, blocks_removed: 5 });
        assert_eq!(catalog.file_count(), 0);
        assert_eq!(catalog.block_count(), 0);
        assert_eq!(transport.block_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_succeeds_with_unreachable_nodes() {
        let catalog = Arc::new(MemoryCatalog::new());
        let transport = Arc::new(MockTransport::new());
        let id = distributed_file(&catalog, &transport).await;
        transport.take_down("http://node-0:5001");
        transport.take_down("http://node-1:5001");

        let report = delete_file(catalog.as_ref(), transport.as_ref(), id, 4)
            .await
            .unwrap();

        assert_eq!(report.blocks_removed, 5);
        assert_eq!(transport.deletes.load(Ordering::SeqCst), 5);
        assert!(catalog.get_file(id).await.unwrap().is_none());
        assert!(catalog.list_blocks(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_file() {
        let catalog = MemoryCatalog::new();
        let transport = MockTransport::new();
        assert!(matches!(
            delete_file(&catalog, &transport, 9, 1).await,
            Err(EngineError::FileNotFound(9))
        ));
    }
}
