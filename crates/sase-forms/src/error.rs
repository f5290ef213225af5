//! Error types for the forms engine

use thiserror::Error;

use crate::application::SessionError;
use crate::domain::aggregates::SchemaError;
use crate::domain::services::FormulaError;
use crate::ports::inbound::UseCaseError;
use crate::ports::outbound::RepositoryError;

/// Crate-level error, wrapping the per-layer errors.
#[derive(Error, Debug)]
pub enum FormsError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    UseCase(#[from] UseCaseError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FormsError>;
