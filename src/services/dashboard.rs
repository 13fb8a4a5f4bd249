use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::ServiceError;
use crate::assessment::AssignmentStatus;
use crate::database::models::GoalStatus;
use crate::store::{call, AssessmentStore, CallPolicy, DirectoryStore, GamificationStore, Store};
use crate::types::Role;

const RANKING_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStats {
    pub active_clients: u64,
    pub pending_assessments: u64,
    /// Rounded percentage of completed assignments
    pub completion_rate: u32,
    pub achievements_count: u64,
    pub total_achievements: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub position: u32,
    pub name: String,
    pub points: String,
    pub initials: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressItem {
    pub name: String,
    pub value: u32,
}

fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Read-only aggregates for the manager dashboard
#[derive(Clone)]
pub struct Dashboard {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl Dashboard {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn manager_stats(&self, organization_id: Uuid, user_id: Uuid) -> Result<ManagerStats, ServiceError> {
        let store = &self.store;
        let p = &self.policy;
        let (active_clients, pending, total, completed, achievements_count, total_achievements) = futures::try_join!(
            call::read(p, "count_profiles", || store.count_profiles(organization_id, Role::Leader)),
            call::read(p, "count_assignments", || {
                store.count_assignments(organization_id, Some(AssignmentStatus::Pending))
            }),
            call::read(p, "count_assignments", || store.count_assignments(organization_id, None)),
            call::read(p, "count_assignments", || {
                store.count_assignments(organization_id, Some(AssignmentStatus::Completed))
            }),
            call::read(p, "count_user_achievements", || store.count_user_achievements(user_id)),
            call::read(p, "count_achievements", || store.count_achievements()),
        )?;

        Ok(ManagerStats {
            active_clients,
            pending_assessments: pending,
            completion_rate: percent(completed, total),
            achievements_count,
            total_achievements,
        })
    }

    /// Top leaders by points
    pub async fn ranking(&self, organization_id: Uuid) -> Result<Vec<RankingEntry>, ServiceError> {
        let store = &self.store;
        let top = call::read(&self.policy, "top_profiles_by_points", || {
            store.top_profiles_by_points(organization_id, Role::Leader, RANKING_SIZE)
        })
        .await?;

        Ok(top
            .iter()
            .enumerate()
            .map(|(i, profile)| RankingEntry {
                position: i as u32 + 1,
                name: profile.full_name.clone().unwrap_or_else(|| "Member".to_string()),
                points: format!("{} pts", profile.points),
                initials: profile.initials(),
            })
            .collect())
    }

    pub async fn progress(&self, organization_id: Uuid, user_id: Uuid) -> Result<Vec<ProgressItem>, ServiceError> {
        let store = &self.store;
        let p = &self.policy;
        let (total, completed, goals, goals_done) = futures::try_join!(
            call::read(p, "count_assignments", || store.count_assignments(organization_id, None)),
            call::read(p, "count_assignments", || {
                store.count_assignments(organization_id, Some(AssignmentStatus::Completed))
            }),
            call::read(p, "count_goals", || store.count_goals(user_id, None)),
            call::read(p, "count_goals", || store.count_goals(user_id, Some(GoalStatus::Completed))),
        )?;

        Ok(vec![
            ProgressItem { name: "Tasks completed".to_string(), value: percent(completed, total) },
            ProgressItem { name: "Goals reached".to_string(), value: percent(goals_done, goals) },
            ProgressItem {
                name: "Assessments applied".to_string(),
                value: if total > 0 { 100 } else { 0 },
            },
        ])
    }
}
