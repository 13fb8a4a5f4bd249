use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{Achievement, Goal, GoalView, UnlockView, UserAchievement};
use crate::store::{call, CallPolicy, DirectoryStore, GamificationStore, Store};
use crate::types::{Page, Pagination};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAchievement {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub points: i32,
}

#[derive(Clone)]
pub struct Achievements {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl Achievements {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    /// Lowest points first
    pub async fn list(&self, pagination: Pagination) -> Result<Page<Achievement>, ServiceError> {
        let store = &self.store;
        Ok(call::read(&self.policy, "list_achievements", || store.list_achievements(pagination)).await?)
    }

    pub async fn create(&self, input: NewAchievement) -> Result<Achievement, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::Invalid("achievement title must not be empty".to_string()));
        }
        if input.points < 0 {
            return Err(ServiceError::Invalid("achievement points must not be negative".to_string()));
        }

        let achievement = Achievement {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            icon: input.icon,
            points: input.points,
            created_at: Utc::now(),
        };
        call::write(&self.policy, "insert_achievement", self.store.insert_achievement(&achievement)).await?;
        info!(achievement_id = %achievement.id, points = achievement.points, "created achievement");
        Ok(achievement)
    }

    /// Unlock `achievement_id` for a member of `organization_id` and credit
    /// its points to their profile
    pub async fn award(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> Result<UserAchievement, ServiceError> {
        let store = &self.store;
        let achievement = call::read(&self.policy, "get_achievement", || store.get_achievement(achievement_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("achievement", achievement_id))?;
        let profile = call::read(&self.policy, "get_profile", || store.get_profile(user_id)).await?;
        if !profile.is_some_and(|p| p.organization_id == organization_id) {
            return Err(ServiceError::not_found("profile", user_id));
        }

        let unlock = UserAchievement::new(user_id, achievement_id);
        call::write(&self.policy, "award_achievement", store.award_achievement(&unlock, achievement.points)).await?;
        info!(%user_id, %achievement_id, points = achievement.points, "achievement unlocked");
        Ok(unlock)
    }

    /// Newest first
    pub async fn recent_unlocks(&self, organization_id: Uuid, limit: u32) -> Result<Vec<UnlockView>, ServiceError> {
        let store = &self.store;
        Ok(call::read(&self.policy, "recent_unlocks", || store.recent_unlocks(organization_id, limit)).await?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_value: i32,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub reward_points: i32,
}

#[derive(Clone)]
pub struct Goals {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl Goals {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    /// Earliest deadline first
    pub async fn list(&self, organization_id: Uuid, pagination: Pagination) -> Result<Page<GoalView>, ServiceError> {
        let store = &self.store;
        Ok(call::read(&self.policy, "list_goals", || store.list_goals(organization_id, pagination)).await?)
    }

    pub async fn create(&self, organization_id: Uuid, input: NewGoal) -> Result<Goal, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::Invalid("goal title must not be empty".to_string()));
        }
        if input.target_value <= 0 {
            return Err(ServiceError::Invalid("goal target must be positive".to_string()));
        }

        let store = &self.store;
        let owner = call::read(&self.policy, "get_profile", || store.get_profile(input.user_id)).await?;
        if !owner.is_some_and(|p| p.organization_id == organization_id) {
            return Err(ServiceError::not_found("profile", input.user_id));
        }

        let goal = Goal::new(
            input.user_id,
            input.title.trim(),
            input.description,
            input.target_value,
            input.deadline,
            input.reward_points,
        );
        call::write(&self.policy, "insert_goal", store.insert_goal(&goal)).await?;
        info!(goal_id = %goal.id, user_id = %goal.user_id, "created goal");
        Ok(goal)
    }
}
