//! Inventory error types

use thiserror::Error;

/// Inventory errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("invalid registration token")]
    InvalidToken,

    #[error("instance not found")]
    InstanceNotFound,

    #[error("invalid update request")]
    UpdateValidation,

    /// Reserved for persistent backends; the in-memory store never fails a
    /// query.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;
