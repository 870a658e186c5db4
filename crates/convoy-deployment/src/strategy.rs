//! Deployment strategy trait

use crate::error::Result;
use async_trait::async_trait;
use convoy_types::{DeploymentRecord, Labels};

/// A pluggable rollout algorithm.
///
/// Strategies mutate the record's `status` and `progress` in place and
/// persist through the deployment store; instances are only ever touched
/// through scoped desired-state patches.
#[async_trait]
pub trait DeploymentStrategy: Send + Sync {
    /// Perform the first step of a rollout on a just-created record.
    async fn start_deployment(&self, record: &mut DeploymentRecord) -> Result<()>;

    /// Perform one reconciliation tick: re-read the inventory counters,
    /// update progress, and advance the state machine.
    ///
    /// A failure-threshold breach marks the record `Failed` and returns
    /// [`DeploymentError::FailureThresholdExceeded`](crate::DeploymentError::FailureThresholdExceeded)
    /// without persisting; the trigger service owns the rollback handshake.
    async fn progress_deployment(&self, record: &mut DeploymentRecord) -> Result<()>;

    /// Reset failed instances matching the selector back to unknown,
    /// called before a rollback re-deploys over the pool.
    async fn reset_failed_instances(&self, selector: &Labels) -> Result<()>;
}
