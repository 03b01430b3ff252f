//! Trait abstraction for the registry API to enable mocking in tests

use super::ApiError;
use crate::state::{EntityKind, Record, Submission};
use async_trait::async_trait;

/// Registry operations the console needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// List every record of a collection
    async fn list(&self, kind: EntityKind) -> Result<Vec<Record>, ApiError>;

    /// Load one record for editing
    async fn fetch(&self, kind: EntityKind, id: &str) -> Result<Record, ApiError>;

    /// Send a wizard submission (create or update)
    async fn submit(&self, submission: &Submission) -> Result<(), ApiError>;

    /// Delete a record
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError>;
}
