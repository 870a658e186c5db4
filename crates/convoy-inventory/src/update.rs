//! Heartbeat and state patches from agents

use crate::error::{InventoryError, Result};
use crate::store::InventoryStore;
use chrono::Utc;
use convoy_types::{Instance, InstancePatch, VersionState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for an instance update (heartbeat).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub updates: InstancePatch,
}

/// Applies heartbeat patches and answers desired-state polls.
pub struct UpdateService {
    store: Arc<dyn InventoryStore>,
}

impl UpdateService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Apply a patch to an instance. `last_ping` is refreshed on every
    /// update, whatever the patch contains.
    pub async fn update_instance(&self, key: &str, request: UpdateRequest) -> Result<Instance> {
        if key.is_empty() {
            return Err(InventoryError::UpdateValidation);
        }

        let mut patch = request.updates;
        patch.last_ping = Some(Utc::now());

        self.store.update(key, patch).await
    }

    /// The state the coordinator wants this instance to run.
    pub async fn get_desired_state(&self, key: &str) -> Result<VersionState> {
        self.store
            .get(key)
            .await?
            .map(|instance| instance.desired_state)
            .ok_or(InventoryError::InstanceNotFound)
    }
}
