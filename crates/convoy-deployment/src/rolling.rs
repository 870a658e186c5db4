//! Rolling deployment strategy
//!
//! Converges the selected population in bounded batches: at most
//! `batch_size` instances have a desired state ahead of their current state
//! at any time. Progress is recomputed from inventory counters on every
//! tick, so the strategy carries no state of its own between ticks.

use crate::error::{DeploymentError, Result};
use crate::store::DeploymentStore;
use crate::strategy::DeploymentStrategy;
use async_trait::async_trait;
use convoy_inventory::{NeedingUpdateOptions, StateService};
use convoy_types::{DeploymentProgress, DeploymentRecord, DeploymentStatus, Labels};
use std::sync::Arc;
use tracing::{debug, info};

/// The rolling rollout algorithm.
pub struct RollingStrategy {
    store: Arc<dyn DeploymentStore>,
    inventory: Arc<StateService>,
}

impl RollingStrategy {
    pub fn new(store: Arc<dyn DeploymentStore>, inventory: Arc<StateService>) -> Self {
        Self { store, inventory }
    }
}

#[async_trait]
impl DeploymentStrategy for RollingStrategy {
    async fn start_deployment(&self, record: &mut DeploymentRecord) -> Result<()> {
        let selector = record.request.labels.clone();
        let target = record.request.target_state();

        // An empty population means the request selected nothing; reject the
        // rollout rather than completing it vacuously.
        let total = self.inventory.count_by_labels(&selector).await?;
        if total == 0 {
            return Err(DeploymentError::NoMatchingInstances);
        }

        record.progress = DeploymentProgress {
            total_matching_instances: total,
            ..DeploymentProgress::default()
        };

        let batch = self
            .inventory
            .get_needing_update(
                &selector,
                &target,
                NeedingUpdateOptions::limited(record.request.configuration.batch_size),
            )
            .await?;

        if batch.is_empty() {
            // Everything already runs the target state.
            record.status = DeploymentStatus::Completed;
            record.progress.completed_instances = total;
            self.store.update(record).await?;
            info!(deployment_id = %record.id, "Deployment already converged, completed");
            return Ok(());
        }

        for instance in &batch {
            self.inventory
                .update_desired_state(instance.key(), target.clone())
                .await?;
            record.progress.in_progress_instances += 1;
        }

        self.store.update(record).await?;

        info!(
            deployment_id = %record.id,
            total = total,
            batch = batch.len(),
            code_version = %record.request.code_version,
            "Rolling deployment started"
        );

        Ok(())
    }

    async fn progress_deployment(&self, record: &mut DeploymentRecord) -> Result<()> {
        let selector = record.request.labels.clone();
        let target = record.request.target_state();
        let batch_size = record.request.configuration.batch_size;

        // Refresh: a piecewise snapshot of the three counters. Mild skew
        // between the reads self-corrects on the next tick.
        let failed = self.inventory.count_failed(&selector, &target).await?;
        let completed = self.inventory.count_completed(&selector, &target).await?;
        let in_progress = self.inventory.count_in_progress(&selector, &target).await?;

        record.progress.failed_instances = failed;
        record.progress.completed_instances = completed;
        record.progress.in_progress_instances = in_progress;

        // Update: first match wins.
        if failed >= record.request.configuration.failure_threshold {
            record.status = DeploymentStatus::Failed;
            return Err(DeploymentError::FailureThresholdExceeded);
        }

        if completed >= record.progress.total_matching_instances {
            record.status = DeploymentStatus::Completed;
            self.store.update(record).await?;
            info!(deployment_id = %record.id, completed = completed, "Rolling deployment completed");
            return Ok(());
        }

        if in_progress >= batch_size {
            // Batch full; wait for heartbeats to catch up.
            self.store.update(record).await?;
            return Ok(());
        }

        let need = batch_size - in_progress;
        let next = self
            .inventory
            .get_needing_update(&selector, &target, NeedingUpdateOptions::limited(need))
            .await?;

        for instance in &next {
            self.inventory
                .update_desired_state(instance.key(), target.clone())
                .await?;
            record.progress.in_progress_instances += 1;
        }

        self.store.update(record).await?;

        debug!(
            deployment_id = %record.id,
            completed = completed,
            failed = failed,
            refilled = next.len(),
            in_progress = record.progress.in_progress_instances,
            "Rolling deployment progressed"
        );

        Ok(())
    }

    async fn reset_failed_instances(&self, selector: &Labels) -> Result<()> {
        self.inventory.reset_failed_instances(selector).await?;
        Ok(())
    }
}
