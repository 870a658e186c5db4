//! Convoy Deployment - Rollout orchestration
//!
//! This crate drives fleet rollouts:
//!
//! - **DeploymentStore**: persistence capability for deployment records
//! - **Locker**: named mutual exclusion; the single `"deployment"` key
//!   serializes every rollout-mutating operation
//! - **DeploymentStrategy**: the pluggable batching algorithm;
//!   [`RollingStrategy`] is the concrete variant
//! - **TriggerService**: the orchestrator enforcing single-flight, owning
//!   the failure-threshold → automatic-rollback handshake
//!
//! ## Key principle
//!
//! Progress is derived from inventory **counters**, never from an
//! in-memory set of instance names. A strategy is stateless between ticks,
//! so a lost or repeated reconciliation tick converges to the same answer.

#![deny(unsafe_code)]

pub mod error;
pub mod lock;
pub mod memory;
pub mod rolling;
pub mod store;
pub mod strategy;
pub mod trigger;

pub use error::{DeploymentError, Result};
pub use lock::{InMemoryLocker, Locker};
pub use memory::InMemoryDeploymentStore;
pub use rolling::RollingStrategy;
pub use store::DeploymentStore;
pub use strategy::DeploymentStrategy;
pub use trigger::{TriggerService, DEPLOYMENT_LOCK_KEY};
