use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::{AssessmentStore, AssignmentScope, DirectoryStore, GamificationStore, StoreError};
use crate::assessment::model::{
    AssessmentResult, Assignment, AssignmentStatus, AssignmentView, Test, TestSummary,
};
use crate::database::models::{
    Achievement, Goal, GoalStatus, GoalView, Invitation, Organization, Profile, ProfileStatus,
    UnlockView, UserAchievement,
};
use crate::database::repository::Repository;
use crate::database::{DatabaseError, DatabaseManager};
use crate::filter::FilterData;
use crate::types::{Page, Pagination, Role};

const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                StoreError::Decode(e.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Sqlx(inner) => inner.into(),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

const ASSIGNMENT_VIEW_SELECT: &str = "SELECT a.id, a.leader_id, a.test_id, a.organization_id, a.assigned_at, a.completed_at, \
     t.title AS test_title, t.description AS test_description, \
     p.id AS profile_id, p.full_name, p.email, p.avatar_url \
     FROM assignments a \
     LEFT JOIN tests t ON t.id = a.test_id \
     LEFT JOIN profiles p ON p.id = a.leader_id";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(database: &DatabaseManager) -> Self {
        Self { pool: database.pool().clone() }
    }

    fn repo<T>(&self, table: &'static str) -> Repository<T>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        Repository::new(table, self.pool.clone())
    }
}

fn by_id(id: Uuid) -> FilterData {
    FilterData::new().eq("id", id.to_string())
}

fn limit_offset(page: Pagination) -> (i64, i64) {
    (i64::from(page.limit), page.offset() as i64)
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn insert_test(&self, test: &Test) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tests (id, slug, title, description, questions, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(test.id)
        .bind(&test.slug)
        .bind(&test.title)
        .bind(&test.description)
        .bind(Json(&test.questions))
        .bind(test.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_test(&self, id: Uuid) -> Result<Option<Test>, StoreError> {
        Ok(self.repo::<Test>("tests").select_one(by_id(id)).await?)
    }

    async fn get_test_by_slug(&self, slug: &str) -> Result<Option<Test>, StoreError> {
        Ok(self.repo::<Test>("tests").select_one(FilterData::new().eq("slug", slug)).await?)
    }

    async fn list_tests(&self, page: Pagination) -> Result<Page<TestSummary>, StoreError> {
        let (limit, offset) = limit_offset(page);
        let items = sqlx::query_as::<_, TestSummary>(
            "SELECT id, slug, title, description, jsonb_array_length(questions) AS question_count, created_at \
             FROM tests ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total = self.repo::<Test>("tests").count(FilterData::new()).await?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO assignments (id, leader_id, test_id, organization_id, assigned_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(assignment.id)
        .bind(assignment.leader_id)
        .bind(assignment.test_id)
        .bind(assignment.organization_id)
        .bind(assignment.assigned_at)
        .bind(assignment.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        Ok(self.repo::<Assignment>("assignments").select_one(by_id(id)).await?)
    }

    async fn list_assignments(
        &self,
        scope: AssignmentScope,
        page: Pagination,
    ) -> Result<Page<AssignmentView>, StoreError> {
        let (column, id) = match scope {
            AssignmentScope::Organization(id) => ("organization_id", id),
            AssignmentScope::Assignee(id) => ("leader_id", id),
        };
        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "{} WHERE a.{} = $1 ORDER BY a.assigned_at DESC LIMIT $2 OFFSET $3",
            ASSIGNMENT_VIEW_SELECT, column
        );
        let items = sqlx::query_as::<_, AssignmentView>(&sql)
            .bind(id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = self
            .repo::<Assignment>("assignments")
            .count(FilterData::new().eq(column, id.to_string()))
            .await?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn count_assignments(
        &self,
        organization_id: Uuid,
        status: Option<AssignmentStatus>,
    ) -> Result<u64, StoreError> {
        let filter = FilterData::new().eq("organization_id", organization_id.to_string());
        let filter = match status {
            Some(AssignmentStatus::Completed) => filter.not_null("completed_at"),
            Some(AssignmentStatus::Pending) => filter.is_null("completed_at"),
            None => filter,
        };
        let count = self.repo::<Assignment>("assignments").count(filter).await?;
        Ok(count.max(0) as u64)
    }

    async fn mark_assignment_completed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Assignment>, StoreError> {
        let row = sqlx::query_as::<_, Assignment>(
            "UPDATE assignments SET completed_at = COALESCE(completed_at, $2) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_result_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssessmentResult>, StoreError> {
        let filter = FilterData::new().eq("assignment_id", assignment_id.to_string());
        Ok(self.repo::<AssessmentResult>("results").select_one(filter).await?)
    }

    async fn insert_submission(&self, result: &AssessmentResult) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes racing submissions and manual completion
        let completed = sqlx::query("UPDATE assignments SET completed_at = $2 WHERE id = $1 AND completed_at IS NULL")
            .bind(result.assignment_id)
            .bind(result.created_at)
            .execute(&mut *tx)
            .await?;
        if completed.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "assignment {} is already completed",
                result.assignment_id
            )));
        }

        sqlx::query(
            "INSERT INTO results (id, assignment_id, user_id, answers, score, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(result.id)
        .bind(result.assignment_id)
        .bind(result.user_id)
        .bind(Json(&result.answers))
        .bind(Json(&result.score))
        .bind(result.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(organization.id)
            .bind(&organization.name)
            .bind(organization.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.repo::<Organization>("organizations").select_one(by_id(id)).await?)
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO profiles (id, organization_id, role, full_name, email, phone, avatar_url, status, points, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(profile.id)
        .bind(profile.organization_id)
        .bind(profile.role.as_str())
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.status.map(|s| s.as_str()))
        .bind(profile.points)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.repo::<Profile>("profiles").select_one(by_id(id)).await?)
    }

    async fn list_profiles(
        &self,
        organization_id: Uuid,
        role: Role,
        page: Pagination,
    ) -> Result<Page<Profile>, StoreError> {
        let filter = FilterData::new()
            .eq("organization_id", organization_id.to_string())
            .eq("role", role.as_str())
            .order_by("full_name asc");
        Ok(self.repo::<Profile>("profiles").select_page(filter, page).await?)
    }

    async fn count_profiles(&self, organization_id: Uuid, role: Role) -> Result<u64, StoreError> {
        let filter = FilterData::new()
            .eq("organization_id", organization_id.to_string())
            .eq("role", role.as_str());
        let count = self.repo::<Profile>("profiles").count(filter).await?;
        Ok(count.max(0) as u64)
    }

    async fn profile_statuses(
        &self,
        organization_id: Uuid,
        role: Role,
    ) -> Result<Vec<Option<ProfileStatus>>, StoreError> {
        let raw: Vec<Option<String>> =
            sqlx::query_scalar("SELECT status FROM profiles WHERE organization_id = $1 AND role = $2")
                .bind(organization_id)
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await?;
        raw.into_iter()
            .map(|s| s.map(|s| s.parse::<ProfileStatus>()).transpose().map_err(StoreError::Decode))
            .collect()
    }

    async fn top_profiles_by_points(
        &self,
        organization_id: Uuid,
        role: Role,
        limit: u32,
    ) -> Result<Vec<Profile>, StoreError> {
        let filter = FilterData {
            limit: Some(i64::from(limit)),
            ..FilterData::new()
                .eq("organization_id", organization_id.to_string())
                .eq("role", role.as_str())
                .order_by("points desc, full_name asc")
        };
        Ok(self.repo::<Profile>("profiles").select_any(filter).await?)
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO invitations (id, email, token, role, organization_id, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(invitation.id)
        .bind(&invitation.email)
        .bind(&invitation.token)
        .bind(invitation.role.as_str())
        .bind(invitation.organization_id)
        .bind(invitation.created_at)
        .bind(invitation.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_invitations(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let filter = FilterData::new()
            .eq("organization_id", organization_id.to_string())
            .order_by("created_at desc");
        Ok(self.repo::<Invitation>("invitations").select_any(filter).await?)
    }

    async fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        Ok(self
            .repo::<Invitation>("invitations")
            .select_one(FilterData::new().eq("token", token))
            .await?)
    }
}

#[async_trait]
impl GamificationStore for PgStore {
    async fn insert_achievement(&self, achievement: &Achievement) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO achievements (id, title, description, icon, points, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(achievement.id)
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(&achievement.icon)
        .bind(achievement.points)
        .bind(achievement.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_achievements(&self, page: Pagination) -> Result<Page<Achievement>, StoreError> {
        let filter = FilterData::new().order_by("points asc, title asc");
        Ok(self.repo::<Achievement>("achievements").select_page(filter, page).await?)
    }

    async fn get_achievement(&self, id: Uuid) -> Result<Option<Achievement>, StoreError> {
        Ok(self.repo::<Achievement>("achievements").select_one(by_id(id)).await?)
    }

    async fn count_achievements(&self) -> Result<u64, StoreError> {
        let count = self.repo::<Achievement>("achievements").count(FilterData::new()).await?;
        Ok(count.max(0) as u64)
    }

    async fn award_achievement(&self, unlock: &UserAchievement, points: i32) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO user_achievements (id, user_id, achievement_id, earned_at) VALUES ($1, $2, $3, $4)")
            .bind(unlock.id)
            .bind(unlock.user_id)
            .bind(unlock.achievement_id)
            .bind(unlock.earned_at)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query("UPDATE profiles SET points = points + $2 WHERE id = $1")
            .bind(unlock.user_id)
            .bind(points)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::Query(format!("profile {} does not exist", unlock.user_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_user_achievements(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let filter = FilterData::new().eq("user_id", user_id.to_string());
        let count = self.repo::<UserAchievement>("user_achievements").count(filter).await?;
        Ok(count.max(0) as u64)
    }

    async fn recent_unlocks(&self, organization_id: Uuid, limit: u32) -> Result<Vec<UnlockView>, StoreError> {
        let rows = sqlx::query_as::<_, UnlockView>(
            "SELECT ua.id, ua.user_id, ua.earned_at, \
                    a.id AS achievement_id, a.title, a.description, a.icon, a.points, a.created_at AS achievement_created_at, \
                    p.full_name, p.avatar_url \
             FROM user_achievements ua \
             JOIN achievements a ON a.id = ua.achievement_id \
             JOIN profiles p ON p.id = ua.user_id \
             WHERE p.organization_id = $1 \
             ORDER BY ua.earned_at DESC LIMIT $2",
        )
        .bind(organization_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_goal(&self, goal: &Goal) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO goals (id, user_id, title, description, target_value, current_value, deadline, status, reward_points) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(goal.id)
        .bind(goal.user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.target_value)
        .bind(goal.current_value)
        .bind(goal.deadline)
        .bind(goal.status.as_str())
        .bind(goal.reward_points)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_goals(&self, organization_id: Uuid, page: Pagination) -> Result<Page<GoalView>, StoreError> {
        let (limit, offset) = limit_offset(page);
        let items = sqlx::query_as::<_, GoalView>(
            "SELECT g.*, p.id AS profile_id, p.full_name, p.email, p.avatar_url \
             FROM goals g JOIN profiles p ON p.id = g.user_id \
             WHERE p.organization_id = $1 \
             ORDER BY g.deadline ASC LIMIT $2 OFFSET $3",
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM goals g JOIN profiles p ON p.id = g.user_id WHERE p.organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn count_goals(&self, user_id: Uuid, status: Option<GoalStatus>) -> Result<u64, StoreError> {
        let filter = FilterData::new().eq("user_id", user_id.to_string());
        let filter = match status {
            Some(status) => filter.eq("status", status.as_str()),
            None => filter,
        };
        let count = self.repo::<Goal>("goals").count(filter).await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_transient() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_transient());
    }

    #[test]
    fn missing_rows_are_not_retried() {
        let e = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(e, StoreError::Query(_)));
        assert!(!e.is_transient());
    }

    #[test]
    fn missing_database_url_is_unavailable() {
        let e = StoreError::from(DatabaseError::ConfigMissing("DATABASE_URL"));
        assert!(matches!(e, StoreError::Unavailable(_)));
    }
}
