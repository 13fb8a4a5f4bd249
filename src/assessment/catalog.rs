use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::PipelineError;
use super::model::{Test, TestSummary};
use crate::store::{call, AssessmentStore, CallPolicy, Store};
use crate::types::{Page, Pagination};

/// Read side of the test definitions. Tests are append-only: there is no
/// update, so a test referenced by an assignment never changes underneath it.
#[derive(Clone)]
pub struct TestCatalog {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl TestCatalog {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn get_test(&self, test_id: Uuid) -> Result<Test, PipelineError> {
        let store = &self.store;
        debug!(%test_id, "fetching test");
        call::read(&self.policy, "get_test", || store.get_test(test_id))
            .await?
            .ok_or_else(|| PipelineError::not_found("test", test_id))
    }

    pub async fn get_test_by_slug(&self, slug: &str) -> Result<Test, PipelineError> {
        let store = &self.store;
        call::read(&self.policy, "get_test_by_slug", || store.get_test_by_slug(slug))
            .await?
            .ok_or_else(|| PipelineError::not_found("test", slug))
    }

    /// Newest first, without question bodies
    pub async fn list_tests(&self, pagination: Pagination) -> Result<Page<TestSummary>, PipelineError> {
        let store = &self.store;
        Ok(call::read(&self.policy, "list_tests", || store.list_tests(pagination)).await?)
    }

    pub async fn publish(&self, test: Test) -> Result<Test, PipelineError> {
        test.validate().map_err(PipelineError::InvalidTest)?;
        call::write(&self.policy, "insert_test", self.store.insert_test(&test)).await?;
        info!(test_id = %test.id, slug = %test.slug, questions = test.questions.len(), "published test");
        Ok(test)
    }
}
