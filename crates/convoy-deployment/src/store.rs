//! Storage trait for deployment records

use crate::error::Result;
use async_trait::async_trait;
use convoy_types::{DeploymentRecord, DeploymentStatus, Labels};

/// Storage capability for deployment records.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Insert a record, assigning it a unique monotonic id. Returns the
    /// record with the id filled in.
    async fn save(&self, record: DeploymentRecord) -> Result<DeploymentRecord>;

    /// Overwrite a record by id; fails with
    /// [`DeploymentError::NotFound`](crate::DeploymentError::NotFound) when
    /// absent.
    async fn update(&self, record: &DeploymentRecord) -> Result<()>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<Option<DeploymentRecord>>;

    /// All records, oldest first.
    async fn get_all(&self) -> Result<Vec<DeploymentRecord>>;

    /// All records with the given status, oldest first.
    async fn get_by_status(&self, status: DeploymentStatus) -> Result<Vec<DeploymentRecord>>;

    /// Records whose request labels are a superset of the selector and whose
    /// status matches, oldest first.
    async fn get_by_labels_and_status(
        &self,
        selector: &Labels,
        status: DeploymentStatus,
    ) -> Result<Vec<DeploymentRecord>>;
}
