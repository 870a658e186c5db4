//! Deployment error types

use convoy_inventory::InventoryError;
use thiserror::Error;

/// Deployment errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeploymentError {
    #[error("invalid deployment request")]
    InvalidRequest,

    #[error("deployment rollout in progress")]
    RolloutInProgress,

    #[error("deployment not found")]
    NotFound,

    /// Single-flight invariant breach: more than one record is `Running`.
    #[error("more than one in-flight deployment")]
    MoreThanOneInflight,

    /// Raised by a strategy when the failed-instance count reaches the
    /// request's threshold. Never surfaces to operators: the trigger
    /// service catches it and starts an automatic rollback.
    #[error("failure threshold exceeded")]
    FailureThresholdExceeded,

    #[error("no previous completed deployment found")]
    NoPreviousDeployment,

    #[error("no instances match the specified labels")]
    NoMatchingInstances,

    #[error("lock error: {0}")]
    Lock(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeploymentError>;
