//! Fleet simulator fixtures
//!
//! YAML fleet descriptions and patch factories used by integration tests to
//! stand in for real agents. Not part of the runtime path.

use crate::error::{DaemonError, DaemonResult};
use chrono::Utc;
use convoy_inventory::RegistrationRequest;
use convoy_types::{Instance, InstancePatch, InstanceStatus, Labels, VersionState};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A simulated fleet, typically loaded from `simulator.config.yaml`:
///
/// ```yaml
/// instances:
///   - { ip: 192.168.1.1, name: web-1, labels: { env: prod, role: web } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub instances: Vec<InstanceSeed>,
}

/// One instance in a simulated fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSeed {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
}

impl SimulatorConfig {
    pub fn from_yaml(contents: &str) -> DaemonResult<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| DaemonError::Config(format!("invalid simulator config: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> DaemonResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn builder() -> SimulatorConfigBuilder {
        SimulatorConfigBuilder::default()
    }
}

impl InstanceSeed {
    pub fn to_instance(&self) -> Instance {
        Instance {
            ip: self.ip.clone(),
            name: self.name.clone(),
            labels: self.labels.clone(),
            last_ping: Utc::now(),
            status: InstanceStatus::Unknown,
            current_state: VersionState::default(),
            desired_state: VersionState::default(),
        }
    }

    pub fn to_registration_request(&self, token: &str) -> RegistrationRequest {
        RegistrationRequest {
            instance: self.to_instance(),
            token: token.to_string(),
        }
    }
}

/// Builds simulated fleets programmatically.
#[derive(Debug, Default)]
pub struct SimulatorConfigBuilder {
    config: SimulatorConfig,
}

impl SimulatorConfigBuilder {
    pub fn add_instance(mut self, ip: &str, name: &str, labels: Labels) -> Self {
        self.config.instances.push(InstanceSeed {
            ip: ip.to_string(),
            name: name.to_string(),
            labels,
        });
        self
    }

    /// Add `count` instances named `prefix-1..=count` on `base_ip.N`.
    pub fn add_instances_with_pattern(
        mut self,
        base_ip: &str,
        prefix: &str,
        count: usize,
        labels: Labels,
    ) -> Self {
        for i in 1..=count {
            self = self.add_instance(
                &format!("{}.{}", base_ip, i),
                &format!("{}-{}", prefix, i),
                labels.clone(),
            );
        }
        self
    }

    pub fn build(self) -> SimulatorConfig {
        self.config
    }
}

/// A heartbeat patch reporting a healthy instance at the given versions.
pub fn healthy_heartbeat(code_version: &str, configuration_version: &str) -> InstancePatch {
    InstancePatch::heartbeat(
        InstanceStatus::Healthy,
        VersionState::new(code_version, configuration_version),
    )
}

/// A heartbeat patch reporting a failed instance at the given versions.
pub fn failed_heartbeat(code_version: &str, configuration_version: &str) -> InstancePatch {
    InstancePatch::heartbeat(
        InstanceStatus::Failed,
        VersionState::new(code_version, configuration_version),
    )
}
