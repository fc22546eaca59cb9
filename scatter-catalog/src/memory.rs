//! In-memory catalog
//!
//! Same ordering and uniqueness rules as the SQLite catalog, kept in a
//! single `RwLock`. Used by engine tests and for throwaway gateways.

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::models::*;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct Tables {
    files: BTreeMap<FileId, FileRecord>,
    blocks: BTreeMap<BlockId, BlockRecord>,
    machines: BTreeMap<MachineId, Machine>,
    settings: HashMap<String, String>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Catalog held entirely in memory
pub struct MemoryCatalog {
    tables: RwLock<Tables>,
    /// Remaining block inserts before failures start; `usize::MAX` disables
    block_insert_budget: AtomicUsize,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            block_insert_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Make every block insert after the first `n` fail.
    ///
    /// Fault injection for exercising rollback paths.
    pub fn fail_block_inserts_after(&self, n: usize) {
        self.block_insert_budget.store(n, Ordering::SeqCst);
    }

    pub fn file_count(&self) -> usize {
        self.tables.read().files.len()
    }

    pub fn block_count(&self) -> usize {
        self.tables.read().blocks.len()
    }

    fn newest_first(mut files: Vec<FileRecord>) -> Vec<FileRecord> {
        files.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        files
    }

    fn by_name(mut machines: Vec<Machine>) -> Vec<Machine> {
        machines.sort_by(|a, b| a.name.cmp(&b.name));
        machines
    }

    fn name_taken(tables: &Tables, name: &str, except: Option<MachineId>) -> bool {
        tables
            .machines
            .values()
            .any(|m| m.name == name && Some(m.id) != except)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn insert_file(&self, file: NewFile) -> Result<FileRecord> {
        let mut tables = self.tables.write();
        let id = tables.next_id();
        let record = FileRecord {
            id,
            original_name: file.original_name,
            content_hash: file.content_hash,
            total_size: file.total_size,
            block_count: file.block_count,
            block_size: file.block_size,
            status: FileStatus::Distributed.to_string(),
            created_at: Utc::now(),
        };
        tables.files.insert(id, record.clone());
        Ok(record)
    }

    async fn get_file(&self, id: FileId) -> Result<Option<FileRecord>> {
        Ok(self.tables.read().files.get(&id).cloned())
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let files = self.tables.read().files.values().cloned().collect();
        Ok(Self::newest_first(files))
    }

    async fn list_files_by_status(&self, status: FileStatus) -> Result<Vec<FileRecord>> {
        let files = self
            .tables
            .read()
            .files
            .values()
            .filter(|f| f.status == status.as_str())
            .cloned()
            .collect();
        Ok(Self::newest_first(files))
    }

    async fn update_file_status(&self, id: FileId, status: FileStatus) -> Result<()> {
        let mut tables = self.tables.write();
        let file = tables
            .files
            .get_mut(&id)
            .ok_or(CatalogError::NotFound { entity: "file", id })?;
        file.status = status.to_string();
        Ok(())
    }

    async fn delete_file(&self, id: FileId) -> Result<bool> {
        let mut tables = self.tables.write();
        let removed = tables.files.remove(&id).is_some();
        if removed {
            tables.blocks.retain(|_, b| b.file_id != id);
        }
        Ok(removed)
    }

    async fn insert_block(&self, block: NewBlock) -> Result<BlockRecord> {
        let budget = self.block_insert_budget.load(Ordering::SeqCst);
        if budget == 0 {
            return Err(CatalogError::Invalid(format!(
                "injected failure inserting block {} of file {}",
                block.block_number, block.file_id
            )));
        }
        if budget != usize::MAX {
            self.block_insert_budget.store(budget - 1, Ordering::SeqCst);
        }

        let mut tables = self.tables.write();
        if !tables.files.contains_key(&block.file_id) {
            return Err(CatalogError::NotFound {
                entity: "file",
                id: block.file_id,
            });
        }
        let duplicate = tables
            .blocks
            .values()
            .any(|b| b.file_id == block.file_id && b.block_number == block.block_number);
        if duplicate {
            return Err(CatalogError::Duplicate(format!(
                "block {} of file {}",
                block.block_number, block.file_id
            )));
        }

        let id = tables.next_id();
        let record = BlockRecord {
            id,
            file_id: block.file_id,
            block_number: block.block_number,
            content_hash: block.content_hash,
            size: block.size,
            machine_url: block.machine_url,
            storage_path: block.storage_path,
            status: BLOCK_STATUS_STORED.to_string(),
            created_at: Utc::now(),
        };
        tables.blocks.insert(id, record.clone());
        Ok(record)
    }

    async fn list_blocks(&self, file_id: FileId) -> Result<Vec<BlockRecord>> {
        let mut blocks: Vec<_> = self
            .tables
            .read()
            .blocks
            .values()
            .filter(|b| b.file_id == file_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.block_number);
        Ok(blocks)
    }

    async fn delete_blocks(&self, file_id: FileId) -> Result<u64> {
        let mut tables = self.tables.write();
        let before = tables.blocks.len();
        tables.blocks.retain(|_, b| b.file_id != file_id);
        Ok((before - tables.blocks.len()) as u64)
    }

    async fn insert_machine(&self, machine: NewMachine) -> Result<Machine> {
        let mut tables = self.tables.write();
        if Self::name_taken(&tables, &machine.name, None) {
            return Err(CatalogError::Duplicate(format!(
                "machine name '{}'",
                machine.name
            )));
        }
        let id = tables.next_id();
        let record = Machine {
            id,
            name: machine.name,
            url: machine.url,
            storage_path: machine.storage_path,
            is_active: true,
            last_check: None,
            created_at: Utc::now(),
        };
        tables.machines.insert(id, record.clone());
        Ok(record)
    }

    async fn update_machine(&self, id: MachineId, update: MachineUpdate) -> Result<Machine> {
        let mut tables = self.tables.write();
        if Self::name_taken(&tables, &update.name, Some(id)) {
            return Err(CatalogError::Duplicate(format!(
                "machine name '{}'",
                update.name
            )));
        }
        let machine = tables.machines.get_mut(&id).ok_or(CatalogError::NotFound {
            entity: "machine",
            id,
        })?;
        machine.name = update.name;
        machine.url = update.url;
        machine.storage_path = update.storage_path;
        Ok(machine.clone())
    }

    async fn delete_machine(&self, id: MachineId) -> Result<bool> {
        Ok(self.tables.write().machines.remove(&id).is_some())
    }

    async fn get_machine(&self, id: MachineId) -> Result<Option<Machine>> {
        Ok(self.tables.read().machines.get(&id).cloned())
    }

    async fn toggle_machine(&self, id: MachineId) -> Result<Machine> {
        let mut tables = self.tables.write();
        let machine = tables.machines.get_mut(&id).ok_or(CatalogError::NotFound {
            entity: "machine",
            id,
        })?;
        machine.is_active = !machine.is_active;
        Ok(machine.clone())
    }

    async fn record_machine_check(&self, id: MachineId) -> Result<()> {
        if let Some(machine) = self.tables.write().machines.get_mut(&id) {
            machine.last_check = Some(Utc::now());
        }
        Ok(())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>> {
        let machines = self.tables.read().machines.values().cloned().collect();
        Ok(Self::by_name(machines))
    }

    async fn list_active_machines(&self) -> Result<Vec<Machine>> {
        let machines = self
            .tables
            .read()
            .machines
            .values()
            .filter(|m| m.is_active)
            .cloned()
            .collect();
        Ok(Self::by_name(machines))
    }

    async fn get_setting(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .tables
            .read()
            .settings
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.tables
            .write()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
