//! Deployment-facing inventory state operations
//!
//! The deployment core never touches the store directly: it reads the
//! aggregate counters and writes desired states through this facade, which
//! is the whole capability surface a rollout strategy needs.

use crate::error::Result;
use crate::store::{InventoryStore, NeedingUpdateOptions};
use convoy_types::{Instance, InstancePatch, Labels, VersionState};
use std::sync::Arc;

/// Inventory state service for searching and updating instance states.
pub struct StateService {
    store: Arc<dyn InventoryStore>,
}

impl StateService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Instances matching the selector (all of them when it is empty).
    pub async fn get_instances_by_labels(&self, selector: &Labels) -> Result<Vec<Instance>> {
        self.store.get_by_labels(selector).await
    }

    /// Scoped patch setting only the desired state of one instance.
    pub async fn update_desired_state(&self, key: &str, state: VersionState) -> Result<()> {
        let patch = InstancePatch {
            desired_state: Some(state),
            ..InstancePatch::default()
        };
        self.store.update(key, patch).await?;
        Ok(())
    }

    pub async fn count_by_labels(&self, selector: &Labels) -> Result<usize> {
        self.store.count_by_labels(selector).await
    }

    pub async fn get_needing_update(
        &self,
        selector: &Labels,
        target: &VersionState,
        opts: NeedingUpdateOptions,
    ) -> Result<Vec<Instance>> {
        self.store.get_needing_update(selector, target, opts).await
    }

    pub async fn count_needing_update(
        &self,
        selector: &Labels,
        target: &VersionState,
    ) -> Result<usize> {
        self.store.count_needing_update(selector, target).await
    }

    pub async fn count_in_progress(
        &self,
        selector: &Labels,
        target: &VersionState,
    ) -> Result<usize> {
        self.store.count_in_progress(selector, target).await
    }

    pub async fn count_completed(&self, selector: &Labels, target: &VersionState) -> Result<usize> {
        self.store.count_completed(selector, target).await
    }

    pub async fn count_failed(&self, selector: &Labels, target: &VersionState) -> Result<usize> {
        self.store.count_failed(selector, target).await
    }

    /// Unpoison the pool before a rollback re-deploys over it.
    pub async fn reset_failed_instances(&self, selector: &Labels) -> Result<()> {
        self.store.reset_failed_instances(selector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryInventoryStore;

    #[tokio::test]
    async fn update_desired_state_is_a_scoped_patch() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let instance: Instance = serde_json::from_str(
            r#"{"ip": "10.0.0.1", "name": "web-1", "labels": {"env": "prod"}}"#,
        )
        .unwrap();
        store.save(instance).await.unwrap();

        let service = StateService::new(store.clone());
        let target = VersionState::new("v2", "c2");
        service.update_desired_state("web-1", target.clone()).await.unwrap();

        let stored = store.get("web-1").await.unwrap().unwrap();
        assert_eq!(stored.desired_state, target);
        // Nothing else moved.
        assert_eq!(stored.current_state, VersionState::default());
        assert_eq!(stored.labels.len(), 1);

        let selector = Labels::new();
        assert_eq!(service.count_in_progress(&selector, &target).await.unwrap(), 1);
        assert_eq!(service.count_needing_update(&selector, &target).await.unwrap(), 0);
    }
}
