//! Storage trait for the instance inventory

use crate::error::Result;
use async_trait::async_trait;
use convoy_types::{Instance, InstancePatch, Labels, VersionState};

/// Options for [`InventoryStore::get_needing_update`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NeedingUpdateOptions {
    /// Maximum number of instances to return; `0` means unlimited.
    pub limit: usize,
}

impl NeedingUpdateOptions {
    pub fn limited(limit: usize) -> Self {
        Self { limit }
    }
}

/// Storage capability for instances.
///
/// All returns are snapshots: callers never share mutable state with the
/// store. Label arguments are selectors (instance matches when its labels
/// are a superset; an empty selector matches everything), and `target` is
/// the version state a rollout converges toward.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert or overwrite an instance, keyed by name (fallback ip).
    async fn save(&self, instance: Instance) -> Result<()>;

    /// Apply a sparse patch: `labels` merges, everything else overwrites
    /// when present. Returns a copy of the updated instance.
    async fn update(&self, key: &str, patch: InstancePatch) -> Result<Instance>;

    /// Fetch a single instance by key.
    async fn get(&self, key: &str) -> Result<Option<Instance>>;

    /// All stored instances.
    async fn get_all(&self) -> Result<Vec<Instance>>;

    /// Remove an instance; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All instances matching the selector.
    async fn get_by_labels(&self, selector: &Labels) -> Result<Vec<Instance>>;

    /// Cardinality of [`InventoryStore::get_by_labels`].
    async fn count_by_labels(&self, selector: &Labels) -> Result<usize>;

    /// Instances matching the selector whose current state differs from the
    /// target AND whose desired state has not been set to the target yet
    /// (never-started pool). Ordering follows insertion order.
    async fn get_needing_update(
        &self,
        selector: &Labels,
        target: &VersionState,
        opts: NeedingUpdateOptions,
    ) -> Result<Vec<Instance>>;

    /// Cardinality of [`InventoryStore::get_needing_update`] (unlimited).
    async fn count_needing_update(&self, selector: &Labels, target: &VersionState)
        -> Result<usize>;

    /// Instances asked to move to the target that have not converged:
    /// `desired = target` and `current != target`.
    async fn count_in_progress(&self, selector: &Labels, target: &VersionState) -> Result<usize>;

    /// Instances running the target and reporting healthy:
    /// `current = target` and `status = Healthy`.
    async fn count_completed(&self, selector: &Labels, target: &VersionState) -> Result<usize>;

    /// Instances asked to move to the target that reported failed:
    /// `desired = target` and `status = Failed`.
    async fn count_failed(&self, selector: &Labels, target: &VersionState) -> Result<usize>;

    /// Flip every `Failed` instance matching the selector back to `Unknown`.
    /// Idempotent.
    async fn reset_failed_instances(&self, selector: &Labels) -> Result<()>;
}
