//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::FormSummary;
use crate::domain::aggregates::FormSchema;
use crate::domain::value_objects::FormId;
use crate::ports::outbound::RepositoryError;

/// Saved form management use cases
#[async_trait]
pub trait FormUseCases: Send + Sync {
    /// Persist a form and publish its pending events
    async fn save_form(&self, form: &mut FormSchema) -> Result<(), UseCaseError>;

    /// All saved forms
    async fn list_forms(&self) -> Result<Vec<FormSchema>, UseCaseError>;

    /// One summary row per saved form
    async fn list_summaries(&self) -> Result<Vec<FormSummary>, UseCaseError>;

    /// Load a saved form by ID
    async fn load_form(&self, id: &FormId) -> Result<FormSchema, UseCaseError>;

    /// Delete a saved form by ID
    async fn delete_form(&self, id: &FormId) -> Result<(), UseCaseError>;
}

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("form not found: {0}")]
    NotFound(FormId),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("verification failed: {0}")]
    Verification(String),
}
