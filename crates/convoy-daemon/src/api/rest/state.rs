//! Application state for API handlers

use crate::reconciler::Reconciler;
use convoy_deployment::TriggerService;
use convoy_inventory::{RegistrationService, UpdateService};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Instance self-registration
    pub registration: Arc<RegistrationService>,

    /// Heartbeat patches
    pub updates: Arc<UpdateService>,

    /// Rollout orchestration
    pub trigger: Arc<TriggerService>,

    /// Reconciler handle, nudged after deployment-affecting calls
    pub reconciler: Arc<Reconciler>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        registration: Arc<RegistrationService>,
        updates: Arc<UpdateService>,
        trigger: Arc<TriggerService>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self {
            registration,
            updates,
            trigger,
            reconciler,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Uptime as a human-readable string.
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        }
    }
}
