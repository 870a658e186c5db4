//! Instance self-registration

use crate::error::{InventoryError, Result};
use crate::store::InventoryStore;
use chrono::Utc;
use convoy_types::Instance;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for instance registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub instance: Instance,
    #[serde(default)]
    pub token: String,
}

impl RegistrationRequest {
    /// Token validation is a stub: any non-empty token is accepted.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(InventoryError::InvalidToken);
        }
        Ok(())
    }
}

/// Handles instances announcing themselves to the coordinator.
pub struct RegistrationService {
    store: Arc<dyn InventoryStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a registration; returns the stored instance.
    pub async fn register_instance(&self, request: RegistrationRequest) -> Result<Instance> {
        request.validate()?;

        let mut instance = request.instance;
        instance.last_ping = Utc::now();

        self.store.save(instance.clone()).await?;

        tracing::info!(instance = %instance.key(), "Instance registered");

        Ok(instance)
    }

    /// All instances currently in the inventory.
    pub async fn list_all_instances(&self) -> Result<Vec<Instance>> {
        self.store.get_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryInventoryStore;
    use convoy_types::InstanceStatus;

    fn request(token: &str) -> RegistrationRequest {
        RegistrationRequest {
            instance: serde_json::from_str(r#"{"ip": "10.0.0.1", "name": "web-1"}"#).unwrap(),
            token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let service = RegistrationService::new(Arc::new(InMemoryInventoryStore::new()));
        let err = service.register_instance(request("")).await.unwrap_err();
        assert_eq!(err, InventoryError::InvalidToken);
        assert!(service.list_all_instances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn registration_stores_the_instance_with_defaults() {
        let service = RegistrationService::new(Arc::new(InMemoryInventoryStore::new()));
        let before = Utc::now();
        let instance = service.register_instance(request("any-token")).await.unwrap();

        assert_eq!(instance.status, InstanceStatus::Unknown);
        assert!(instance.last_ping >= before);

        let all = service.list_all_instances().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "web-1");
    }
}
