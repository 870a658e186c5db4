//! Convoy Types - Core types for the rolling-deployment coordinator
//!
//! Convoy drives a fleet of self-registered service instances toward a
//! target `(code_version, configuration_version)` pair in bounded batches.
//! This crate holds the domain vocabulary shared by every other crate:
//!
//! - **Instance**: a managed workload reporting heartbeats to the coordinator
//! - **VersionState**: the code/configuration pair an instance runs (current)
//!   or is asked to run (desired)
//! - **DeploymentRequest / DeploymentRecord**: an operator's intent and the
//!   running or historical rollout it produced
//! - **Labels**: the key/value selector used to pick the target population
//!
//! Status enums travel as integers on the wire, so they carry explicit
//! discriminants and serde conversions through `u8`.

#![deny(unsafe_code)]

pub mod deployment;
pub mod instance;
pub mod labels;

pub use deployment::{
    DeploymentProgress, DeploymentRecord, DeploymentRequest, DeploymentStatus,
    RolloutConfiguration,
};
pub use instance::{Instance, InstancePatch, InstanceStatus, VersionState};
pub use labels::{selector_matches, Labels};
