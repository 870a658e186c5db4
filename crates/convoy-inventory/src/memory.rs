//! In-memory inventory store
//!
//! Suitable for a single coordinator process; state is lost on restart.
//! Reads and counts take the read half of the lock, mutations the write
//! half, and every returned instance is a copy.

use crate::error::{InventoryError, Result};
use crate::store::{InventoryStore, NeedingUpdateOptions};
use async_trait::async_trait;
use convoy_types::{selector_matches, Instance, InstancePatch, InstanceStatus, Labels, VersionState};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    instances: HashMap<String, Instance>,
    // Registration order, so batch selection is deterministic.
    order: Vec<String>,
}

impl Inner {
    fn iter_ordered(&self) -> impl Iterator<Item = &Instance> {
        self.order.iter().filter_map(|key| self.instances.get(key))
    }
}

/// In-memory implementation of [`InventoryStore`].
pub struct InMemoryInventoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn needs_update(instance: &Instance, selector: &Labels, target: &VersionState) -> bool {
    selector_matches(&instance.labels, selector)
        && instance.current_state != *target
        && instance.desired_state != *target
}

fn in_progress(instance: &Instance, selector: &Labels, target: &VersionState) -> bool {
    selector_matches(&instance.labels, selector)
        && instance.desired_state == *target
        && instance.current_state != *target
}

fn completed(instance: &Instance, selector: &Labels, target: &VersionState) -> bool {
    selector_matches(&instance.labels, selector)
        && instance.current_state == *target
        && instance.status == InstanceStatus::Healthy
}

fn failed(instance: &Instance, selector: &Labels, target: &VersionState) -> bool {
    selector_matches(&instance.labels, selector)
        && instance.desired_state == *target
        && instance.status == InstanceStatus::Failed
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn save(&self, instance: Instance) -> Result<()> {
        let key = instance.key().to_string();
        let mut inner = self.inner.write().await;

        if !inner.instances.contains_key(&key) {
            inner.order.push(key.clone());
        }
        inner.instances.insert(key, instance);

        Ok(())
    }

    async fn update(&self, key: &str, patch: InstancePatch) -> Result<Instance> {
        let mut inner = self.inner.write().await;
        let instance = inner
            .instances
            .get_mut(key)
            .ok_or(InventoryError::InstanceNotFound)?;

        if let Some(labels) = patch.labels {
            // Merge: existing keys are retained unless overridden.
            instance.labels.extend(labels);
        }
        if let Some(last_ping) = patch.last_ping {
            instance.last_ping = last_ping;
        }
        if let Some(status) = patch.status {
            instance.status = status;
        }
        if let Some(current_state) = patch.current_state {
            instance.current_state = current_state;
        }
        if let Some(desired_state) = patch.desired_state {
            instance.desired_state = desired_state;
        }

        Ok(instance.clone())
    }

    async fn get(&self, key: &str) -> Result<Option<Instance>> {
        let inner = self.inner.read().await;
        Ok(inner.instances.get(key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Instance>> {
        let inner = self.inner.read().await;
        Ok(inner.iter_ordered().cloned().collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let existed = inner.instances.remove(key).is_some();
        if existed {
            inner.order.retain(|k| k != key);
        }
        Ok(existed)
    }

    async fn get_by_labels(&self, selector: &Labels) -> Result<Vec<Instance>> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|i| selector_matches(&i.labels, selector))
            .cloned()
            .collect())
    }

    async fn count_by_labels(&self, selector: &Labels) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|i| selector_matches(&i.labels, selector))
            .count())
    }

    async fn get_needing_update(
        &self,
        selector: &Labels,
        target: &VersionState,
        opts: NeedingUpdateOptions,
    ) -> Result<Vec<Instance>> {
        let inner = self.inner.read().await;
        let matching = inner
            .iter_ordered()
            .filter(|i| needs_update(i, selector, target))
            .cloned();

        Ok(if opts.limit > 0 {
            matching.take(opts.limit).collect()
        } else {
            matching.collect()
        })
    }

    async fn count_needing_update(
        &self,
        selector: &Labels,
        target: &VersionState,
    ) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|i| needs_update(i, selector, target))
            .count())
    }

    async fn count_in_progress(&self, selector: &Labels, target: &VersionState) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|i| in_progress(i, selector, target))
            .count())
    }

    async fn count_completed(&self, selector: &Labels, target: &VersionState) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|i| completed(i, selector, target))
            .count())
    }

    async fn count_failed(&self, selector: &Labels, target: &VersionState) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter_ordered()
            .filter(|i| failed(i, selector, target))
            .count())
    }

    async fn reset_failed_instances(&self, selector: &Labels) -> Result<()> {
        let mut inner = self.inner.write().await;
        for instance in inner.instances.values_mut() {
            if instance.status == InstanceStatus::Failed
                && selector_matches(&instance.labels, selector)
            {
                instance.status = InstanceStatus::Unknown;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn instance(name: &str, ip: &str, labels_in: Labels) -> Instance {
        Instance {
            ip: ip.to_string(),
            name: name.to_string(),
            labels: labels_in,
            last_ping: chrono::Utc::now(),
            status: InstanceStatus::Unknown,
            current_state: VersionState::default(),
            desired_state: VersionState::default(),
        }
    }

    async fn seeded_store() -> InMemoryInventoryStore {
        let store = InMemoryInventoryStore::new();
        for name in ["web-1", "web-2", "web-3"] {
            store
                .save(instance(name, "192.168.1.1", labels(&[("env", "prod")])))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn save_overwrites_by_key() {
        let store = InMemoryInventoryStore::new();
        store
            .save(instance("web-1", "10.0.0.1", labels(&[("env", "prod")])))
            .await
            .unwrap();
        store
            .save(instance("web-1", "10.0.0.9", labels(&[("env", "dev")])))
            .await
            .unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].ip, "10.0.0.9");
    }

    #[tokio::test]
    async fn save_keys_by_ip_when_name_empty() {
        let store = InMemoryInventoryStore::new();
        store
            .save(instance("", "10.0.0.1", labels(&[])))
            .await
            .unwrap();

        assert!(store.get("10.0.0.1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_unknown_instance_fails() {
        let store = InMemoryInventoryStore::new();
        let err = store
            .update("ghost", InstancePatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, InventoryError::InstanceNotFound);
    }

    #[tokio::test]
    async fn patch_merges_labels_and_overwrites_the_rest() {
        let store = InMemoryInventoryStore::new();
        store
            .save(instance("web-1", "10.0.0.1", labels(&[("a", "1"), ("b", "2")])))
            .await
            .unwrap();

        let updated = store
            .update(
                "web-1",
                InstancePatch {
                    labels: Some(labels(&[("a", "9")])),
                    ..InstancePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.labels, labels(&[("a", "9"), ("b", "2")]));

        // A status-only patch leaves labels untouched.
        let updated = store
            .update(
                "web-1",
                InstancePatch {
                    status: Some(InstanceStatus::Healthy),
                    ..InstancePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.labels, labels(&[("a", "9"), ("b", "2")]));
        assert_eq!(updated.status, InstanceStatus::Healthy);
    }

    #[tokio::test]
    async fn returned_instances_are_snapshots() {
        let store = InMemoryInventoryStore::new();
        store
            .save(instance("web-1", "10.0.0.1", labels(&[])))
            .await
            .unwrap();

        let mut copy = store.get("web-1").await.unwrap().unwrap();
        copy.status = InstanceStatus::Failed;

        let stored = store.get("web-1").await.unwrap().unwrap();
        assert_eq!(stored.status, InstanceStatus::Unknown);
    }

    #[tokio::test]
    async fn label_queries_use_superset_matching() {
        let store = seeded_store().await;
        store
            .save(instance("api-1", "192.168.2.1", labels(&[("env", "dev")])))
            .await
            .unwrap();

        assert_eq!(
            store.count_by_labels(&labels(&[("env", "prod")])).await.unwrap(),
            3
        );
        // Empty selector matches all.
        assert_eq!(store.count_by_labels(&labels(&[])).await.unwrap(), 4);
        assert_eq!(
            store
                .count_by_labels(&labels(&[("env", "prod"), ("role", "web")]))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn classification_counters_partition_the_fleet() {
        let store = seeded_store().await;
        let selector = labels(&[("env", "prod")]);
        let target = VersionState::new("v2", "c2");

        // web-1: completed; web-2: in progress; web-3: failed.
        store
            .update(
                "web-1",
                InstancePatch {
                    status: Some(InstanceStatus::Healthy),
                    current_state: Some(target.clone()),
                    desired_state: Some(target.clone()),
                    ..InstancePatch::default()
                },
            )
            .await
            .unwrap();
        store
            .update(
                "web-2",
                InstancePatch {
                    desired_state: Some(target.clone()),
                    ..InstancePatch::default()
                },
            )
            .await
            .unwrap();
        store
            .update(
                "web-3",
                InstancePatch {
                    status: Some(InstanceStatus::Failed),
                    desired_state: Some(target.clone()),
                    ..InstancePatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(store.count_completed(&selector, &target).await.unwrap(), 1);
        assert_eq!(store.count_in_progress(&selector, &target).await.unwrap(), 2);
        assert_eq!(store.count_failed(&selector, &target).await.unwrap(), 1);
        // Everyone already has desired_state = target, so the never-started
        // pool is empty even though web-2 and web-3 have not converged.
        assert_eq!(
            store.count_needing_update(&selector, &target).await.unwrap(),
            0
        );
        assert!(store
            .get_needing_update(&selector, &target, NeedingUpdateOptions::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn needing_update_respects_limit_and_order() {
        let store = seeded_store().await;
        let selector = labels(&[("env", "prod")]);
        let target = VersionState::new("v2", "c2");

        let batch = store
            .get_needing_update(&selector, &target, NeedingUpdateOptions::limited(2))
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].name, "web-1");
        assert_eq!(batch[1].name, "web-2");

        // limit = 0 means unlimited.
        let all = store
            .get_needing_update(&selector, &target, NeedingUpdateOptions::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn reset_failed_is_scoped_and_idempotent() {
        let store = seeded_store().await;
        store
            .save(instance("api-1", "192.168.2.1", labels(&[("env", "dev")])))
            .await
            .unwrap();
        for key in ["web-1", "api-1"] {
            store
                .update(
                    key,
                    InstancePatch {
                        status: Some(InstanceStatus::Failed),
                        ..InstancePatch::default()
                    },
                )
                .await
                .unwrap();
        }

        store
            .reset_failed_instances(&labels(&[("env", "prod")]))
            .await
            .unwrap();
        assert_eq!(
            store.get("web-1").await.unwrap().unwrap().status,
            InstanceStatus::Unknown
        );
        // Out-of-scope instance untouched.
        assert_eq!(
            store.get("api-1").await.unwrap().unwrap().status,
            InstanceStatus::Failed
        );

        // Second reset is a no-op.
        store
            .reset_failed_instances(&labels(&[("env", "prod")]))
            .await
            .unwrap();
        assert_eq!(
            store.get("web-1").await.unwrap().unwrap().status,
            InstanceStatus::Unknown
        );
    }

    #[tokio::test]
    async fn delete_removes_from_order() {
        let store = seeded_store().await;
        assert!(store.delete("web-2").await.unwrap());
        assert!(!store.delete("web-2").await.unwrap());

        let names: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["web-1", "web-3"]);
    }
}
