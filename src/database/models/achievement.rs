use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub earned_at: DateTime<Utc>,
}

impl UserAchievement {
    pub fn new(user_id: Uuid, achievement_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            achievement_id,
            earned_at: Utc::now(),
        }
    }
}

/// Unlock joined with the achievement and the member who earned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub earned_at: DateTime<Utc>,
    pub achievement: Achievement,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for UnlockView {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            earned_at: row.try_get("earned_at")?,
            achievement: Achievement {
                id: row.try_get("achievement_id")?,
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                icon: row.try_get("icon")?,
                points: row.try_get("points")?,
                created_at: row.try_get("achievement_created_at")?,
            },
            full_name: row.try_get("full_name")?,
            avatar_url: row.try_get("avatar_url")?,
        })
    }
}
