//! Convoy Inventory - Instance registry and state services
//!
//! This crate owns the fleet inventory:
//!
//! - **InventoryStore**: the storage capability trait, with an in-memory
//!   implementation suitable for a single coordinator process
//! - **RegistrationService**: instances announce themselves here
//! - **UpdateService**: heartbeat patches from agents
//! - **StateService**: the aggregate queries and scoped desired-state writes
//!   the deployment core drives rollouts with
//!
//! The in-memory store is authoritative for classification semantics: every
//! instance falls into the needing-update / in-progress / completed / failed
//! buckets purely by comparing its labels, status, and version states
//! against a deployment's target. Persistent backends must reproduce those
//! predicates exactly.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod register;
pub mod state;
pub mod store;
pub mod update;

pub use error::{InventoryError, Result};
pub use memory::InMemoryInventoryStore;
pub use register::{RegistrationRequest, RegistrationService};
pub use state::StateService;
pub use store::{InventoryStore, NeedingUpdateOptions};
pub use update::{UpdateRequest, UpdateService};
