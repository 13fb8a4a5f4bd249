//! Services around the pipeline: the organization directory, invitations,
//! gamification and dashboard aggregates.

pub mod dashboard;
pub mod directory;
pub mod gamification;

use thiserror::Error;

use crate::store::StoreError;

pub use dashboard::Dashboard;
pub use directory::{Directory, Invitations};
pub use gamification::{Achievements, Goals};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Persistence(StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound { entity, id: id.to_string() }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Persistence(other),
        }
    }
}
