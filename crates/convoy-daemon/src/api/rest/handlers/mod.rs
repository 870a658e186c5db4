//! API handlers

mod deploy;
mod health;
mod inventory;

pub use deploy::{deployment_status, progress_deployment, trigger_deployment, trigger_rollback};
pub use health::{daemon_status, health_check};
pub use inventory::{list_instances, register_instance, update_instance};
