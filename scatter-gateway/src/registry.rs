//! Machine registry
//!
//! Management of the block nodes that new distributions are placed on.

use crate::error::{EngineError, EngineResult};
use crate::node_client::BlockTransport;
use scatter_catalog::{Catalog, CatalogError, Machine, MachineId, MachineUpdate, NewMachine};
use scatter_core::normalize_machine_url;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Health of one machine as observed just now
#[derive(Debug, Clone, Serialize)]
pub struct MachineStatus {
    pub machine: Machine,
    pub online: bool,
}

#[derive(Clone)]
pub struct MachineRegistry {
    catalog: Arc<dyn Catalog>,
    transport: Arc<dyn BlockTransport>,
}

impl MachineRegistry {
    pub fn new(catalog: Arc<dyn Catalog>, transport: Arc<dyn BlockTransport>) -> Self {
        Self { catalog, transport }
    }

    #[instrument(skip(self))]
    pub async fn add(&self, name: &str, url: &str, storage_path: &str) -> EngineResult<Machine> {
        let (name, url, storage_path) = validate(name, url, storage_path)?;
        let machine = self
            .catalog
            .insert_machine(NewMachine {
                name,
                url,
                storage_path,
            })
            .await?;
        info!(id = machine.id, name = %machine.name, url = %machine.url, "Machine added");
        Ok(machine)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: MachineId,
        name: &str,
        url: &str,
        storage_path: &str,
    ) -> EngineResult<Machine> {
        let (name, url, storage_path) = validate(name, url, storage_path)?;
        self.catalog
            .update_machine(
                id,
                MachineUpdate {
                    name,
                    url,
                    storage_path,
                },
            )
            .await
            .map_err(|e| not_found_as_machine(e, id))
    }

    /// Flip whether the machine takes part in new distributions
    pub async fn toggle(&self, id: MachineId) -> EngineResult<Machine> {
        let machine = self
            .catalog
            .toggle_machine(id)
            .await
            .map_err(|e| not_found_as_machine(e, id))?;
        info!(id, active = machine.is_active, "Machine toggled");
        Ok(machine)
    }

    /// Remove a machine; blocks already stored on it are left in place
    pub async fn remove(&self, id: MachineId) -> EngineResult<()> {
        if !self.catalog.delete_machine(id).await? {
            return Err(EngineError::MachineNotFound(id));
        }
        info!(id, "Machine removed");
        Ok(())
    }

    pub async fn get(&self, id: MachineId) -> EngineResult<Machine> {
        self.catalog
            .get_machine(id)
            .await?
            .ok_or(EngineError::MachineNotFound(id))
    }

    pub async fn list(&self) -> EngineResult<Vec<Machine>> {
        Ok(self.catalog.list_machines().await?)
    }

    /// Probe the machine's node and stamp `last_check`
    #[instrument(skip(self))]
    pub async fn check_status(&self, id: MachineId) -> EngineResult<MachineStatus> {
        let machine = self.get(id).await?;
        let online = self.transport.health_check(&machine.url).await;
        self.catalog.record_machine_check(id).await?;
        let machine = self.get(id).await?;
        Ok(MachineStatus { machine, online })
    }
}

fn validate(name: &str, url: &str, storage_path: &str) -> EngineResult<(String, String, String)> {
    let name = name.trim();
    let url = url.trim();
    let storage_path = storage_path.trim();
    if name.is_empty() || url.is_empty() || storage_path.is_empty() {
        return Err(EngineError::Validation(
            "Name, URL and storage path are required".to_string(),
        ));
    }
    Ok((
        name.to_string(),
        normalize_machine_url(url),
        storage_path.to_string(),
    ))
}

fn not_found_as_machine(err: CatalogError, id: MachineId) -> EngineError {
    match err {
        CatalogError::NotFound { .. } => EngineError::MachineNotFound(id),
        other => other.into(),
    }
}
