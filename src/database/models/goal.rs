use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::decode_text;
use crate::assessment::model::ProfileSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Missed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "missed" => Ok(GoalStatus::Missed),
            other => Err(format!("unknown goal status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_value: i32,
    pub current_value: i32,
    pub deadline: DateTime<Utc>,
    pub status: GoalStatus,
    pub reward_points: i32,
}

impl Goal {
    /// New goals start active with no progress
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        target_value: i32,
        deadline: DateTime<Utc>,
        reward_points: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description,
            target_value,
            current_value: 0,
            deadline,
            status: GoalStatus::Active,
            reward_points,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Goal {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            target_value: row.try_get("target_value")?,
            current_value: row.try_get("current_value")?,
            deadline: row.try_get("deadline")?,
            status: decode_text(row, "status")?,
            reward_points: row.try_get("reward_points")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub profile: Option<ProfileSummary>,
}

impl<'r> FromRow<'r, PgRow> for GoalView {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let profile_id: Option<Uuid> = row.try_get("profile_id")?;
        let profile = match profile_id {
            Some(_) => Some(ProfileSummary {
                full_name: row.try_get("full_name")?,
                email: row.try_get("email")?,
                avatar_url: row.try_get("avatar_url")?,
            }),
            None => None,
        };
        Ok(Self { goal: Goal::from_row(row)?, profile })
    }
}
