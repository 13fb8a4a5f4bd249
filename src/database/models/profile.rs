use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{decode_text, decode_text_opt};
use crate::assessment::model::ProfileSummary;
use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Active,
    Inactive,
    Pending,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
            ProfileStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProfileStatus::Active),
            "inactive" => Ok(ProfileStatus::Inactive),
            "pending" => Ok(ProfileStatus::Pending),
            other => Err(format!("unknown profile status '{}'", other)),
        }
    }
}

/// Member of an organization: a manager or one of their leaders (clients)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub status: Option<ProfileStatus>,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(organization_id: Uuid, role: Role, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            role,
            full_name: Some(full_name.into()),
            email: Some(email.into()),
            phone: None,
            avatar_url: None,
            status: Some(ProfileStatus::Active),
            points: 0,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    /// Up to two upper-case initials of the display name
    pub fn initials(&self) -> String {
        self.full_name
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

impl<'r> FromRow<'r, PgRow> for Profile {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            organization_id: row.try_get("organization_id")?,
            role: decode_text(row, "role")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            avatar_url: row.try_get("avatar_url")?,
            status: decode_text_opt(row, "status")?,
            points: row.try_get("points")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_take_first_two_words() {
        let p = Profile::new(Uuid::new_v4(), Role::Leader, "ana maria souza", "ana@example.com");
        assert_eq!(p.initials(), "AM");

        let mut p = p;
        p.full_name = None;
        assert_eq!(p.initials(), "");
    }
}
