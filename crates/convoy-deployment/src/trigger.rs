//! Trigger service - rollout orchestration entry point
//!
//! Every operation that can mutate the in-flight rollout runs under the
//! `"deployment"` lock, then re-checks the single-`Running`-record
//! precondition, which together enforce the single-flight guarantee.

use crate::error::{DeploymentError, Result};
use crate::lock::Locker;
use crate::store::DeploymentStore;
use crate::strategy::DeploymentStrategy;
use convoy_types::{
    DeploymentRecord, DeploymentRequest, DeploymentStatus, Labels, RolloutConfiguration,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The only lock key the coordinator uses.
pub const DEPLOYMENT_LOCK_KEY: &str = "deployment";

/// Orchestrates rollouts: validates requests, enforces single-flight,
/// delegates batching to the strategy, and turns a failure-threshold breach
/// into an automatic rollback.
pub struct TriggerService {
    store: Arc<dyn DeploymentStore>,
    locker: Arc<dyn Locker>,
    strategy: Arc<dyn DeploymentStrategy>,
}

impl TriggerService {
    pub fn new(
        store: Arc<dyn DeploymentStore>,
        locker: Arc<dyn Locker>,
        strategy: Arc<dyn DeploymentStrategy>,
    ) -> Self {
        Self {
            store,
            locker,
            strategy,
        }
    }

    /// Initiate a new rollout.
    pub async fn trigger_deployment(&self, request: DeploymentRequest) -> Result<DeploymentRecord> {
        if request.code_version.is_empty() {
            return Err(DeploymentError::InvalidRequest);
        }

        self.locker.lock(DEPLOYMENT_LOCK_KEY).await?;
        let result = self.trigger_locked(request).await;
        self.release_lock().await;
        result
    }

    async fn trigger_locked(&self, request: DeploymentRequest) -> Result<DeploymentRecord> {
        if self.is_rollout_in_progress().await? {
            return Err(DeploymentError::RolloutInProgress);
        }

        let mut record = self.store.save(DeploymentRecord::running(request)).await?;

        info!(
            deployment_id = %record.id,
            code_version = %record.request.code_version,
            "Deployment triggered"
        );

        if let Err(err) = self.strategy.start_deployment(&mut record).await {
            // The record stays Running; a retry will see RolloutInProgress
            // until an operator cancels it through a rollback.
            error!(deployment_id = %record.id, error = %err, "Failed to start deployment");
            return Err(err);
        }

        Ok(record)
    }

    /// All currently running rollouts (at most one, by invariant).
    pub async fn get_deployment_status(&self) -> Result<Vec<DeploymentRecord>> {
        self.store.get_by_status(DeploymentStatus::Running).await
    }

    /// Run one reconciliation tick against the in-flight rollout.
    ///
    /// Returns `None` when nothing is running. When the strategy trips the
    /// failure threshold, the now-`Failed` record is persisted, an automatic
    /// rollback is started, and the failed record is returned.
    pub async fn progress_deployment(&self) -> Result<Option<DeploymentRecord>> {
        self.locker.lock(DEPLOYMENT_LOCK_KEY).await?;
        let result = self.progress_locked().await;
        self.release_lock().await;
        result
    }

    async fn progress_locked(&self) -> Result<Option<DeploymentRecord>> {
        let mut records = self.store.get_by_status(DeploymentStatus::Running).await?;
        if records.is_empty() {
            return Ok(None);
        }
        if records.len() > 1 {
            return Err(DeploymentError::MoreThanOneInflight);
        }

        let mut record = records.remove(0);
        match self.strategy.progress_deployment(&mut record).await {
            Ok(()) => Ok(Some(record)),
            Err(DeploymentError::FailureThresholdExceeded) => {
                // The strategy marked the record Failed but left it
                // unpersisted; the rollback handshake happens here.
                self.store.update(&record).await?;

                warn!(
                    deployment_id = %record.id,
                    failed = record.progress.failed_instances,
                    threshold = record.request.configuration.failure_threshold,
                    "Failure threshold exceeded, rolling back"
                );

                if let Err(err) = self
                    .rollback_locked(
                        record.request.labels.clone(),
                        record.request.configuration.clone(),
                    )
                    .await
                {
                    error!(deployment_id = %record.id, error = %err, "Automatic rollback failed");
                }

                Ok(Some(record))
            }
            Err(err) => Err(err),
        }
    }

    /// Roll the population back to the most recent completed rollout
    /// matching the selector.
    pub async fn trigger_rollback(
        &self,
        labels: Labels,
        configuration: RolloutConfiguration,
    ) -> Result<DeploymentRecord> {
        self.locker.lock(DEPLOYMENT_LOCK_KEY).await?;
        let result = self.rollback_locked(labels, configuration).await;
        self.release_lock().await;
        result
    }

    // Assumes the deployment lock is held: also the tail of the automatic
    // rollback path, which already owns it.
    async fn rollback_locked(
        &self,
        labels: Labels,
        configuration: RolloutConfiguration,
    ) -> Result<DeploymentRecord> {
        // Cancel any in-flight rollout.
        for mut running in self.store.get_by_status(DeploymentStatus::Running).await? {
            running.status = DeploymentStatus::Failed;
            self.store.update(&running).await?;
            info!(deployment_id = %running.id, "Cancelled running deployment for rollback");
        }

        // Unpoison the pool so the rollback can re-deploy over it.
        self.strategy.reset_failed_instances(&labels).await?;

        let previous = self
            .store
            .get_by_labels_and_status(&labels, DeploymentStatus::Completed)
            .await?;
        let previous = previous.last().ok_or(DeploymentError::NoPreviousDeployment)?;

        let request = DeploymentRequest {
            code_version: previous.request.code_version.clone(),
            configuration_version: previous.request.configuration_version.clone(),
            labels,
            configuration,
        };

        let mut record = self.store.save(DeploymentRecord::running(request)).await?;

        info!(
            deployment_id = %record.id,
            previous_id = %previous.id,
            code_version = %record.request.code_version,
            "Rollback triggered"
        );

        self.strategy.start_deployment(&mut record).await?;
        Ok(record)
    }

    async fn is_rollout_in_progress(&self) -> Result<bool> {
        Ok(!self
            .store
            .get_by_status(DeploymentStatus::Running)
            .await?
            .is_empty())
    }

    // Mirrors a deferred unlock: the operation's own result wins, an unlock
    // failure only logs.
    async fn release_lock(&self) {
        if let Err(err) = self.locker.unlock(DEPLOYMENT_LOCK_KEY).await {
            warn!(error = %err, "Failed to release deployment lock");
        }
    }
}
