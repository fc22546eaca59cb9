//! The catalog interface used by the gateway engines

use crate::error::Result;
use crate::models::*;
use async_trait::async_trait;

/// Persistent store of file, block, machine and setting records.
///
/// Every method is its own short unit of work; nothing here holds a
/// transaction open across calls.
#[async_trait]
pub trait Catalog: Send + Sync {
    // ===== Files =====

    async fn insert_file(&self, file: NewFile) -> Result<FileRecord>;

    async fn get_file(&self, id: FileId) -> Result<Option<FileRecord>>;

    /// All files, newest first
    async fn list_files(&self) -> Result<Vec<FileRecord>>;

    /// Files with the given status, newest first
    async fn list_files_by_status(&self, status: FileStatus) -> Result<Vec<FileRecord>>;

    async fn update_file_status(&self, id: FileId, status: FileStatus) -> Result<()>;

    /// Returns whether a row was removed
    async fn delete_file(&self, id: FileId) -> Result<bool>;

    // ===== Blocks =====

    async fn insert_block(&self, block: NewBlock) -> Result<BlockRecord>;

    /// Blocks of a file ordered by block number
    async fn list_blocks(&self, file_id: FileId) -> Result<Vec<BlockRecord>>;

    /// Returns the number of rows removed
    async fn delete_blocks(&self, file_id: FileId) -> Result<u64>;

    // ===== Machines =====

    async fn insert_machine(&self, machine: NewMachine) -> Result<Machine>;

    async fn update_machine(&self, id: MachineId, update: MachineUpdate) -> Result<Machine>;

    async fn delete_machine(&self, id: MachineId) -> Result<bool>;

    async fn get_machine(&self, id: MachineId) -> Result<Option<Machine>>;

    /// Flip `is_active` and return the updated machine
    async fn toggle_machine(&self, id: MachineId) -> Result<Machine>;

    /// Stamp `last_check` with the current time
    async fn record_machine_check(&self, id: MachineId) -> Result<()>;

    /// All machines ordered by name
    async fn list_machines(&self) -> Result<Vec<Machine>>;

    /// Active machines ordered by name
    async fn list_active_machines(&self) -> Result<Vec<Machine>>;

    // ===== Settings =====

    async fn get_setting(&self, key: &str, default: &str) -> Result<String>;

    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;
}
