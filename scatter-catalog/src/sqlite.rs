//! SQLite catalog
//!
//! Provides the `Catalog` operations on top of a sqlx connection pool.

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::models::*;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Database configuration
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scatter.db"),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// SQLite-backed catalog
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open (creating if needed) the database file and run migrations
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", config.path.display());
        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!(path = %config.path.display(), "Opened catalog database");
        let catalog = Self { pool };
        catalog.migrate().await?;
        Ok(catalog)
    }

    /// Private in-memory database on a single connection
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // One connection that never expires, or the database vanishes with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let catalog = Self { pool };
        catalog.migrate().await?;
        Ok(catalog)
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Catalog migrations complete");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_machine(&self, id: MachineId) -> Result<Machine> {
        self.get_machine(id)
            .await?
            .ok_or(CatalogError::NotFound {
                entity: "machine",
                id,
            })
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    // =========================================================================
    // FILE OPERATIONS
    // =========================================================================

    #[instrument(skip(self, file), fields(name = %file.original_name))]
    async fn insert_file(&self, file: NewFile) -> Result<FileRecord> {
        let id = sqlx::query(
            r#"
            INSERT INTO files (original_name, content_hash, total_size, block_count, block_size, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&file.original_name)
        .bind(&file.content_hash)
        .bind(file.total_size)
        .bind(file.block_count)
        .bind(file.block_size)
        .bind(FileStatus::Distributed.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(file_id = id, "File recorded");
        self.get_file(id).await?.ok_or(CatalogError::NotFound {
            entity: "file",
            id,
        })
    }

    async fn get_file(&self, id: FileId) -> Result<Option<FileRecord>> {
        let result = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(result)
    }

    async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let result = sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(result)
    }

    async fn list_files_by_status(&self, status: FileStatus) -> Result<Vec<FileRecord>> {
        let result = sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files WHERE status = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn update_file_status(&self, id: FileId, status: FileStatus) -> Result<()> {
        let result = sqlx::query("UPDATE files SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound { entity: "file", id });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, id: FileId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // BLOCK OPERATIONS
    // =========================================================================

    #[instrument(skip(self, block), fields(file_id = block.file_id, block = block.block_number))]
    async fn insert_block(&self, block: NewBlock) -> Result<BlockRecord> {
        let id = sqlx::query(
            r#"
            INSERT INTO blocks (file_id, block_number, content_hash, size, machine_url, storage_path, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(block.file_id)
        .bind(block.block_number)
        .bind(&block.content_hash)
        .bind(block.size)
        .bind(&block.machine_url)
        .bind(&block.storage_path)
        .bind(BLOCK_STATUS_STORED)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            CatalogError::from_insert(
                e,
                format!("block {} of file {}", block.block_number, block.file_id),
            )
        })?
        .last_insert_rowid();

        let result = sqlx::query_as::<_, BlockRecord>("SELECT * FROM blocks WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(result)
    }

    async fn list_blocks(&self, file_id: FileId) -> Result<Vec<BlockRecord>> {
        let result = sqlx::query_as::<_, BlockRecord>(
            "SELECT * FROM blocks WHERE file_id = ? ORDER BY block_number ASC",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn delete_blocks(&self, file_id: FileId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM blocks WHERE file_id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // MACHINE OPERATIONS
    // =========================================================================

    #[instrument(skip(self, machine), fields(name = %machine.name))]
    async fn insert_machine(&self, machine: NewMachine) -> Result<Machine> {
        let id = sqlx::query(
            r#"
            INSERT INTO machines (name, url, storage_path, is_active, created_at)
            VALUES (?, ?, ?, 1, ?)
            "#,
        )
        .bind(&machine.name)
        .bind(&machine.url)
        .bind(&machine.storage_path)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::from_insert(e, format!("machine name '{}'", machine.name)))?
        .last_insert_rowid();

        debug!(machine_id = id, url = %machine.url, "Machine registered");
        self.fetch_machine(id).await
    }

    #[instrument(skip(self, update))]
    async fn update_machine(&self, id: MachineId, update: MachineUpdate) -> Result<Machine> {
        let result = sqlx::query(
            "UPDATE machines SET name = ?, url = ?, storage_path = ? WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.url)
        .bind(&update.storage_path)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::from_insert(e, format!("machine name '{}'", update.name)))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity: "machine",
                id,
            });
        }
        self.fetch_machine(id).await
    }

    #[instrument(skip(self))]
    async fn delete_machine(&self, id: MachineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM machines WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_machine(&self, id: MachineId) -> Result<Option<Machine>> {
        let result = sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn toggle_machine(&self, id: MachineId) -> Result<Machine> {
        let result = sqlx::query("UPDATE machines SET is_active = NOT is_active WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound {
                entity: "machine",
                id,
            });
        }
        self.fetch_machine(id).await
    }

    async fn record_machine_check(&self, id: MachineId) -> Result<()> {
        sqlx::query("UPDATE machines SET last_check = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>> {
        let result = sqlx::query_as::<_, Machine>("SELECT * FROM machines ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(result)
    }

    async fn list_active_machines(&self) -> Result<Vec<Machine>> {
        let result = sqlx::query_as::<_, Machine>(
            "SELECT * FROM machines WHERE is_active = 1 ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(result)
    }

    // =========================================================================
    // SETTINGS OPERATIONS
    // =========================================================================

    async fn get_setting(&self, key: &str, default: &str) -> Result<String> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    #[instrument(skip(self))]
    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
