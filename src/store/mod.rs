//! Data-access collaborator for the pipeline and the surrounding dashboard.
//!
//! Every table is reached through filtered reads ("where column = value,
//! ordered, paginated") and single-row inserts/updates. Two backends exist:
//! [`MemoryStore`] for tests and dry runs, and [`PgStore`] for Postgres.

pub mod call;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::assessment::model::{
    AssessmentResult, Assignment, AssignmentStatus, AssignmentView, Test, TestSummary,
};
use crate::database::models::{
    Achievement, Goal, GoalStatus, GoalView, Invitation, Organization, Profile, ProfileStatus,
    UnlockView, UserAchievement,
};
use crate::types::{Page, Pagination, Role};

pub use call::CallPolicy;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call '{operation}' timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    /// Uniqueness or other constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Query error: {0}")]
    Query(String),
}

impl StoreError {
    /// Errors worth retrying for idempotent reads
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout { .. })
    }
}

/// Which side of an assignment listing is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentScope {
    Organization(Uuid),
    Assignee(Uuid),
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn insert_test(&self, test: &Test) -> Result<(), StoreError>;

    async fn get_test(&self, id: Uuid) -> Result<Option<Test>, StoreError>;

    async fn get_test_by_slug(&self, slug: &str) -> Result<Option<Test>, StoreError>;

    /// Newest first
    async fn list_tests(&self, page: Pagination) -> Result<Page<TestSummary>, StoreError>;

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StoreError>;

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError>;

    /// Newest assigned first, joined with test title and assignee profile
    async fn list_assignments(
        &self,
        scope: AssignmentScope,
        page: Pagination,
    ) -> Result<Page<AssignmentView>, StoreError>;

    async fn count_assignments(
        &self,
        organization_id: Uuid,
        status: Option<AssignmentStatus>,
    ) -> Result<u64, StoreError>;

    /// Sets the completion timestamp only when it is still unset and returns
    /// the row as stored afterwards; `None` when the assignment does not exist.
    async fn mark_assignment_completed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Assignment>, StoreError>;

    async fn get_result_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssessmentResult>, StoreError>;

    /// Insert the result and complete its assignment as one unit.
    ///
    /// A second result for the same assignment, or a result for an
    /// assignment already completed, fails with [`StoreError::Conflict`] and
    /// leaves everything unchanged.
    async fn insert_submission(&self, result: &AssessmentResult) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), StoreError>;

    async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Ordered by full name
    async fn list_profiles(
        &self,
        organization_id: Uuid,
        role: Role,
        page: Pagination,
    ) -> Result<Page<Profile>, StoreError>;

    async fn count_profiles(&self, organization_id: Uuid, role: Role) -> Result<u64, StoreError>;

    async fn profile_statuses(
        &self,
        organization_id: Uuid,
        role: Role,
    ) -> Result<Vec<Option<ProfileStatus>>, StoreError>;

    /// Highest points first
    async fn top_profiles_by_points(
        &self,
        organization_id: Uuid,
        role: Role,
        limit: u32,
    ) -> Result<Vec<Profile>, StoreError>;

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), StoreError>;

    /// Newest first
    async fn list_invitations(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError>;

    async fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError>;
}

#[async_trait]
pub trait GamificationStore: Send + Sync {
    async fn insert_achievement(&self, achievement: &Achievement) -> Result<(), StoreError>;

    /// Lowest points first
    async fn list_achievements(&self, page: Pagination) -> Result<Page<Achievement>, StoreError>;

    async fn get_achievement(&self, id: Uuid) -> Result<Option<Achievement>, StoreError>;

    async fn count_achievements(&self) -> Result<u64, StoreError>;

    /// Record the unlock and credit `points` to the user's profile together
    async fn award_achievement(&self, unlock: &UserAchievement, points: i32) -> Result<(), StoreError>;

    async fn count_user_achievements(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Newest first, restricted to members of the organization
    async fn recent_unlocks(&self, organization_id: Uuid, limit: u32) -> Result<Vec<UnlockView>, StoreError>;

    async fn insert_goal(&self, goal: &Goal) -> Result<(), StoreError>;

    /// Earliest deadline first, restricted to members of the organization
    async fn list_goals(&self, organization_id: Uuid, page: Pagination) -> Result<Page<GoalView>, StoreError>;

    async fn count_goals(&self, user_id: Uuid, status: Option<GoalStatus>) -> Result<u64, StoreError>;
}

/// Everything the services need from persistence
pub trait Store: AssessmentStore + DirectoryStore + GamificationStore {}

impl<T> Store for T where T: AssessmentStore + DirectoryStore + GamificationStore {}
