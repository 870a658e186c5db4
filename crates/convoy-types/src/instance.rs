//! Instance types for managed workloads
//!
//! An Instance is a server or workload that registered itself with the
//! coordinator and reports its state through heartbeat patches.

use crate::labels::Labels;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `(code_version, configuration_version)` pair.
///
/// Used both for what an instance reports it is running (`current_state`)
/// and for what the coordinator asked it to run (`desired_state`). The
/// zero value (both strings empty) is the state of a freshly registered
/// instance that no rollout has touched yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionState {
    /// Version of the code artifact
    #[serde(default)]
    pub code_version: String,

    /// Version of the configuration applied alongside the code
    #[serde(default)]
    pub configuration_version: String,
}

impl VersionState {
    pub fn new(code_version: impl Into<String>, configuration_version: impl Into<String>) -> Self {
        Self {
            code_version: code_version.into(),
            configuration_version: configuration_version.into(),
        }
    }
}

/// Health-check status reported by an instance.
///
/// Travels as an integer on the wire: `Unknown = 0`, `Healthy = 1`,
/// `Failed = 2`. `Unknown` is the value every instance starts with on
/// registration and returns to when a rollback unpoisons it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InstanceStatus {
    Unknown = 0,
    Healthy = 1,
    Failed = 2,
}

impl Default for InstanceStatus {
    fn default() -> Self {
        InstanceStatus::Unknown
    }
}

impl From<InstanceStatus> for u8 {
    fn from(status: InstanceStatus) -> u8 {
        status as u8
    }
}

impl TryFrom<u8> for InstanceStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(InstanceStatus::Unknown),
            1 => Ok(InstanceStatus::Healthy),
            2 => Ok(InstanceStatus::Failed),
            other => Err(format!("invalid instance status: {}", other)),
        }
    }
}

/// A managed workload registered with the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Address of the instance
    #[serde(default)]
    pub ip: String,

    /// Host name; the primary storage key (falls back to `ip` when empty)
    #[serde(default)]
    pub name: String,

    /// Key/value pairs used for population selection
    #[serde(default)]
    pub labels: Labels,

    /// Timestamp of the last heartbeat patch (set on registration)
    #[serde(default = "Utc::now")]
    pub last_ping: DateTime<Utc>,

    /// Last reported health-check status
    #[serde(default)]
    pub status: InstanceStatus,

    /// What the agent reports it is running
    #[serde(default)]
    pub current_state: VersionState,

    /// What the coordinator has asked it to run
    #[serde(default)]
    pub desired_state: VersionState,
}

impl Instance {
    /// The storage key: `name`, or `ip` when the name is empty.
    pub fn key(&self) -> &str {
        if self.name.is_empty() {
            &self.ip
        } else {
            &self.name
        }
    }

    /// True when the agent has not yet converged on its desired state.
    pub fn update_needed(&self) -> bool {
        self.current_state != self.desired_state
    }
}

/// A sparse patch applied to a stored instance.
///
/// `labels` merges into the existing map (existing keys are retained unless
/// overridden); every other field overwrites when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstancePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ping: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstanceStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<VersionState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_state: Option<VersionState>,
}

impl InstancePatch {
    /// A heartbeat patch reporting a status and the running state.
    pub fn heartbeat(status: InstanceStatus, current_state: VersionState) -> Self {
        Self {
            status: Some(status),
            current_state: Some(current_state),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_as_integer() {
        let json = serde_json::to_string(&InstanceStatus::Healthy).unwrap();
        assert_eq!(json, "1");

        let status: InstanceStatus = serde_json::from_str("2").unwrap();
        assert_eq!(status, InstanceStatus::Failed);

        assert!(serde_json::from_str::<InstanceStatus>("7").is_err());
    }

    #[test]
    fn key_falls_back_to_ip() {
        let mut instance: Instance = serde_json::from_str(r#"{"ip": "10.0.0.1"}"#).unwrap();
        assert_eq!(instance.key(), "10.0.0.1");

        instance.name = "web-1".to_string();
        assert_eq!(instance.key(), "web-1");
    }

    #[test]
    fn registration_body_defaults() {
        let instance: Instance =
            serde_json::from_str(r#"{"ip": "10.0.0.1", "name": "web-1", "labels": {"env": "prod"}}"#)
                .unwrap();

        assert_eq!(instance.status, InstanceStatus::Unknown);
        assert_eq!(instance.current_state, VersionState::default());
        assert_eq!(instance.desired_state, VersionState::default());
    }

    #[test]
    fn update_needed_compares_both_fields() {
        let mut instance: Instance = serde_json::from_str(r#"{"name": "web-1"}"#).unwrap();
        assert!(!instance.update_needed());

        instance.desired_state = VersionState::new("v2", "c1");
        assert!(instance.update_needed());

        instance.current_state = VersionState::new("v2", "c1");
        assert!(!instance.update_needed());
    }
}
