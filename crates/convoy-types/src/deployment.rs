//! Deployment types for fleet rollouts
//!
//! A DeploymentRecord tracks one attempt to converge a selected population
//! of instances to a target version state.

use crate::instance::VersionState;
use crate::labels::Labels;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a deployment record.
///
/// Integer wire encoding: `Unknown = 0`, `Running = 1`, `Completed = 2`,
/// `Failed = 3`. `Completed` and `Failed` are terminal; a failed rollout is
/// only ever re-entered through a fresh rollback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DeploymentStatus {
    Unknown = 0,
    Running = 1,
    Completed = 2,
    Failed = 3,
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        DeploymentStatus::Unknown
    }
}

impl From<DeploymentStatus> for u8 {
    fn from(status: DeploymentStatus) -> u8 {
        status as u8
    }
}

impl TryFrom<u8> for DeploymentStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeploymentStatus::Unknown),
            1 => Ok(DeploymentStatus::Running),
            2 => Ok(DeploymentStatus::Completed),
            3 => Ok(DeploymentStatus::Failed),
            other => Err(format!("invalid deployment status: {}", other)),
        }
    }
}

/// Rollout tuning knobs supplied by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutConfiguration {
    /// How many instances may be updating concurrently
    #[serde(default)]
    pub batch_size: usize,

    /// Abort the rollout once this many instances have failed against the
    /// target state
    #[serde(default)]
    pub failure_threshold: usize,
}

/// An operator's intent: converge the instances matching `labels` to the
/// given code and configuration versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub code_version: String,

    #[serde(default)]
    pub configuration_version: String,

    /// Selector for the target population
    #[serde(default)]
    pub labels: Labels,

    #[serde(default)]
    pub configuration: RolloutConfiguration,
}

impl DeploymentRequest {
    /// The version state this rollout converges instances toward.
    pub fn target_state(&self) -> VersionState {
        VersionState {
            code_version: self.code_version.clone(),
            configuration_version: self.configuration_version.clone(),
        }
    }
}

/// Aggregate progress counters for one rollout, derived from inventory
/// queries rather than a per-instance journal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentProgress {
    /// Instances matching the request labels when the rollout started
    pub total_matching_instances: usize,

    /// Instances asked to move to the target state that have not converged
    pub in_progress_instances: usize,

    /// Instances running the target state and reporting healthy
    pub completed_instances: usize,

    /// Instances asked to move to the target state that reported failed
    pub failed_instances: usize,
}

/// A running or historical rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Store-assigned opaque id, empty until saved
    #[serde(default)]
    pub id: String,

    pub request: DeploymentRequest,

    #[serde(default)]
    pub status: DeploymentStatus,

    #[serde(default)]
    pub progress: DeploymentProgress,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// A fresh `Running` record for the given request, ready to be saved.
    pub fn running(request: DeploymentRequest) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            request,
            status: DeploymentStatus::Running,
            progress: DeploymentProgress::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
