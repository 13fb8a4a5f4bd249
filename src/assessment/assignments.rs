use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::PipelineError;
use super::model::{Assignment, AssignmentStats, AssignmentStatus, AssignmentView};
use crate::store::{call, AssessmentStore, AssignmentScope, CallPolicy, DirectoryStore, Store};
use crate::types::{Page, Pagination, Role};

/// Creates assignments and tracks their completion.
#[derive(Clone)]
pub struct AssignmentManager {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl AssignmentManager {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    /// Assign `test_id` to a leader of `organization_id`.
    ///
    /// The same test may be assigned to the same leader more than once.
    pub async fn assign(
        &self,
        leader_id: Uuid,
        test_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Assignment, PipelineError> {
        let store = &self.store;

        let test = call::read(&self.policy, "get_test", || store.get_test(test_id)).await?;
        if test.is_none() {
            return Err(PipelineError::not_found("test", test_id));
        }

        let leader = call::read(&self.policy, "get_profile", || store.get_profile(leader_id)).await?;
        match leader {
            Some(p) if p.organization_id == organization_id && p.role == Role::Leader => {}
            _ => return Err(PipelineError::not_found("leader", leader_id)),
        }

        let assignment = Assignment::new(leader_id, test_id, organization_id);
        call::write(&self.policy, "insert_assignment", store.insert_assignment(&assignment)).await?;

        info!(
            assignment_id = %assignment.id,
            %leader_id,
            %test_id,
            %organization_id,
            "created assignment"
        );
        Ok(assignment)
    }

    /// Newest assigned first
    pub async fn list_for_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<AssignmentView>, PipelineError> {
        let store = &self.store;
        let scope = AssignmentScope::Organization(organization_id);
        Ok(call::read(&self.policy, "list_assignments", || store.list_assignments(scope, pagination)).await?)
    }

    /// Newest assigned first
    pub async fn list_for_assignee(
        &self,
        leader_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<AssignmentView>, PipelineError> {
        let store = &self.store;
        let scope = AssignmentScope::Assignee(leader_id);
        Ok(call::read(&self.policy, "list_assignments", || store.list_assignments(scope, pagination)).await?)
    }

    pub async fn get_by_id(&self, assignment_id: Uuid) -> Result<Assignment, PipelineError> {
        let store = &self.store;
        debug!(%assignment_id, "fetching assignment");
        call::read(&self.policy, "get_assignment", || store.get_assignment(assignment_id))
            .await?
            .ok_or_else(|| PipelineError::not_found("assignment", assignment_id))
    }

    /// Join one assignment with its test and assignee, as the listings do
    pub async fn view(&self, assignment: Assignment) -> Result<AssignmentView, PipelineError> {
        let store = &self.store;
        let (test, profile) = futures::try_join!(
            call::read(&self.policy, "get_test", || store.get_test(assignment.test_id)),
            call::read(&self.policy, "get_profile", || store.get_profile(assignment.leader_id)),
        )?;
        let (title, description) = match test {
            Some(t) => (Some(t.title), Some(t.description)),
            None => (None, None),
        };
        Ok(AssignmentView::new(assignment, title, description, profile.map(|p| p.summary())))
    }

    /// Stamp the assignment completed. Once completed the first timestamp is
    /// kept and later calls return the assignment unchanged.
    pub async fn mark_completed(&self, assignment_id: Uuid) -> Result<Assignment, PipelineError> {
        let assignment = call::write(
            &self.policy,
            "mark_assignment_completed",
            self.store.mark_assignment_completed(assignment_id, Utc::now()),
        )
        .await?
        .ok_or_else(|| PipelineError::not_found("assignment", assignment_id))?;

        info!(%assignment_id, completed_at = ?assignment.completed_at, "assignment completed");
        Ok(assignment)
    }

    pub async fn stats(&self, organization_id: Uuid) -> Result<AssignmentStats, PipelineError> {
        let store = &self.store;
        let (total, completed) = futures::try_join!(
            call::read(&self.policy, "count_assignments", || store.count_assignments(organization_id, None)),
            call::read(&self.policy, "count_assignments", || {
                store.count_assignments(organization_id, Some(AssignmentStatus::Completed))
            }),
        )?;
        Ok(AssignmentStats::from_counts(total, completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::fixtures::{self, Fixture};
    use crate::store::{AssessmentStore, MemoryStore, StoreError};

    async fn setup() -> (Arc<MemoryStore>, AssignmentManager, Fixture) {
        let store = Arc::new(MemoryStore::new());
        let fixture = fixtures::seed(&*store).await.unwrap();
        let manager = AssignmentManager::new(store.clone(), CallPolicy::default());
        (store, manager, fixture)
    }

    #[tokio::test]
    async fn assign_creates_pending_assignment() {
        let (_, manager, f) = setup().await;
        let a = manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();
        assert_eq!(a.status(), AssignmentStatus::Pending);

        let fetched = manager.get_by_id(a.id).await.unwrap();
        assert_eq!(fetched, a);
    }

    #[tokio::test]
    async fn assign_unknown_test_creates_nothing() {
        let (store, manager, f) = setup().await;
        let err = manager.assign(f.leader.id, Uuid::new_v4(), f.organization.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { entity: "test", .. }));
        assert_eq!(store.count_assignments(f.organization.id, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn assign_requires_leader_in_organization() {
        let (_, manager, f) = setup().await;
        let err = manager.assign(f.leader.id, f.test.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { entity: "leader", .. }));

        // Managers are not assignees
        let err = manager.assign(f.manager.id, f.test.id, f.organization.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { entity: "leader", .. }));
    }

    #[tokio::test]
    async fn repeat_assignments_are_allowed() {
        let (_, manager, f) = setup().await;
        manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();
        manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();
        let stats = manager.stats(f.organization.id).await.unwrap();
        assert_eq!(stats, AssignmentStats { total: 2, pending: 2, completed: 0 });
    }

    #[tokio::test]
    async fn mark_completed_is_idempotent() {
        let (_, manager, f) = setup().await;
        let a = manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();

        let first = manager.mark_completed(a.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = manager.mark_completed(a.id).await.unwrap();

        assert!(first.is_completed());
        assert_eq!(first.completed_at, second.completed_at);

        let stats = manager.stats(f.organization.id).await.unwrap();
        assert_eq!(stats, AssignmentStats { total: 1, pending: 0, completed: 1 });
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_joined() {
        let (_, manager, f) = setup().await;
        let older = manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();

        let page = manager.list_for_organization(f.organization.id, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].assignment.id, newer.id);
        assert_eq!(page.items[1].assignment.id, older.id);
        assert_eq!(page.items[0].test_title.as_deref(), Some(f.test.title.as_str()));
        assert_eq!(
            page.items[0].profile.as_ref().and_then(|p| p.full_name.as_deref()),
            f.leader.full_name.as_deref()
        );

        let mine = manager.list_for_assignee(f.leader.id, Pagination::new(2, 1)).await.unwrap();
        assert_eq!(mine.total, 2);
        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].assignment.id, older.id);
    }

    #[tokio::test]
    async fn single_view_matches_listing() {
        let (_, manager, f) = setup().await;
        let a = manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();

        let view = manager.view(a.clone()).await.unwrap();
        let listed = manager.list_for_assignee(f.leader.id, Pagination::default()).await.unwrap();
        assert_eq!(view, listed.items[0]);
        assert_eq!(view.profile.and_then(|p| p.full_name), f.leader.full_name);
    }

    #[tokio::test]
    async fn reads_retry_but_writes_do_not() {
        let (store, manager, f) = setup().await;
        let policy = CallPolicy { backoff: std::time::Duration::from_millis(1), ..CallPolicy::default() };
        let manager = AssignmentManager::new(store.clone(), policy);
        let a = manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap();

        store.fail_next(StoreError::Unavailable("connection reset".into()));
        assert_eq!(manager.get_by_id(a.id).await.unwrap().id, a.id);

        store.fail_next(StoreError::Unavailable("connection reset".into()));
        let err = manager.mark_completed(a.id).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(StoreError::Unavailable(_))));
        assert!(!manager.get_by_id(a.id).await.unwrap().is_completed());
    }
}
