//! In-memory deployment store

use crate::error::{DeploymentError, Result};
use crate::store::DeploymentStore;
use async_trait::async_trait;
use chrono::Utc;
use convoy_types::{selector_matches, DeploymentRecord, DeploymentStatus, Labels};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    records: HashMap<String, DeploymentRecord>,
    // Creation order; rollback picks "the most recent previous completed"
    // as the last matching entry.
    order: Vec<String>,
    next_id: u64,
}

impl Inner {
    fn iter_ordered(&self) -> impl Iterator<Item = &DeploymentRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }
}

/// In-memory implementation of [`DeploymentStore`].
pub struct InMemoryDeploymentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDeploymentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryDeploymentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeploymentStore for InMemoryDeploymentStore {
    async fn save(&self, mut record: DeploymentRecord) -> Result<DeploymentRecord> {
        let mut inner = self.inner.write().await;

        inner.next_id += 1;
        record.id = format!("deployment-{:03}", inner.next_id);

        let now = Utc::now();
        record.created_at = now;
        record.updated_at = now;

        inner.order.push(record.id.clone());
        inner.records.insert(record.id.clone(), record.clone());

        Ok(record)
    }

    async fn update(&self, record: &DeploymentRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.records.contains_key(&record.id) {
            return Err(DeploymentError::NotFound);
        }

        let mut stored = record.clone();
        stored.updated_at = Utc::now();
        inner.records.insert(stored.id.clone(), stored);

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<DeploymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<DeploymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.iter_ordered().cloned().collect())
    }

    async fn get_by_status(&self, status: DeploymentStatus) -> Result<Vec<DeploymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn get_by_labels_and_status(
        &self,
        selector: &Labels,
        status: DeploymentStatus,
    ) -> Result<Vec<DeploymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|r| r.status == status && selector_matches(&r.request.labels, selector))
            .cloned()
            .collect())
    }
}
