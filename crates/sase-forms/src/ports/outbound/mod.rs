//! Outbound ports (Repository traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::FormSchema;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::FormId;

/// Saved forms collection port
///
/// The collection is ordered: `upsert` replaces a form in place or appends
/// it, and `list` returns forms in that order.
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// All saved forms, in collection order
    async fn list(&self) -> Result<Vec<FormSchema>, RepositoryError>;

    /// Find form by ID
    async fn find_by_id(&self, id: &FormId) -> Result<Option<FormSchema>, RepositoryError> {
        Ok(self.list().await?.into_iter().find(|form| form.id() == id))
    }

    /// Replace the form with the same id, or append it
    async fn upsert(&self, form: &FormSchema) -> Result<(), RepositoryError>;

    /// Remove a form. Returns `false` when no form had that id.
    async fn delete_by_id(&self, id: &FormId) -> Result<bool, RepositoryError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError>;
}

/// Repository error type
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored forms are not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
