use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors surfaced by the assessment pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid answer set: {0}")]
    InvalidAnswerSet(String),

    /// Test definition rejected at publish time
    #[error("Invalid test: {0}")]
    InvalidTest(String),

    #[error("Assignment {0} has already been submitted")]
    AlreadySubmitted(Uuid),

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        PipelineError::NotFound { entity, id: id.to_string() }
    }

    /// Validation errors are raised before any mutation and are never retried
    pub fn is_validation(&self) -> bool {
        !matches!(self, PipelineError::Persistence(_))
    }
}
