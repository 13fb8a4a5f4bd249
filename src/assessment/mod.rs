//! DISC assessment pipeline: catalog, assignment, answer collection and scoring.

pub mod assignments;
pub mod catalog;
pub mod collector;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod scorer;

use std::sync::Arc;

pub use assignments::AssignmentManager;
pub use catalog::TestCatalog;
pub use collector::ResponseSession;
pub use error::PipelineError;
pub use model::*;
pub use scorer::Scorer;

use crate::store::{CallPolicy, Store};

/// The pipeline's services over one shared store
#[derive(Clone)]
pub struct Pipeline {
    pub catalog: TestCatalog,
    pub assignments: AssignmentManager,
    pub scorer: Scorer,
}

impl Pipeline {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self {
            catalog: TestCatalog::new(store.clone(), policy),
            assignments: AssignmentManager::new(store.clone(), policy),
            scorer: Scorer::new(store, policy),
        }
    }
}
