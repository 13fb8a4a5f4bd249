use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AssessmentStore, AssignmentScope, DirectoryStore, GamificationStore, StoreError};
use crate::assessment::model::{
    AssessmentResult, Assignment, AssignmentStatus, AssignmentView, Test, TestSummary,
};
use crate::database::models::{
    Achievement, Goal, GoalStatus, GoalView, Invitation, Organization, Profile, ProfileStatus,
    UnlockView, UserAchievement,
};
use crate::types::{Page, Pagination, Role};

#[derive(Default)]
struct State {
    organizations: HashMap<Uuid, Organization>,
    profiles: HashMap<Uuid, Profile>,
    tests: HashMap<Uuid, Test>,
    assignments: HashMap<Uuid, Assignment>,
    /// Keyed by assignment id, one result per assignment
    results: HashMap<Uuid, AssessmentResult>,
    invitations: Vec<Invitation>,
    achievements: HashMap<Uuid, Achievement>,
    unlocks: Vec<UserAchievement>,
    goals: HashMap<Uuid, Goal>,
}

/// In-process store with the same semantics as [`super::PgStore`].
///
/// Every write happens under one lock, so a submission's result insert and
/// completion stamp are observed together or not at all.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    faults: Mutex<VecDeque<Option<StoreError>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with `error`. Queued faults are consumed
    /// one per call, in order.
    pub fn fail_next(&self, error: StoreError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push_back(Some(error));
        }
    }

    /// Let `calls` store calls through before any fault queued after this
    pub fn pass_next(&self, calls: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.extend(std::iter::repeat_with(|| None).take(calls));
        }
    }

    fn check_fault(&self) -> Result<(), StoreError> {
        match self.faults.lock() {
            Ok(mut faults) => match faults.pop_front() {
                Some(Some(error)) => Err(error),
                _ => Ok(()),
            },
            Err(_) => Err(StoreError::Unavailable("memory store fault queue poisoned".to_string())),
        }
    }
}

fn page_of<T: Clone>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = items.len() as u64;
    Page::new(pagination.slice(&items).to_vec(), total, pagination)
}

fn conflict(entity: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::Conflict(format!("{} {} already exists", entity, id))
}

impl State {
    fn assignment_view(&self, assignment: &Assignment) -> AssignmentView {
        let test = self.tests.get(&assignment.test_id);
        AssignmentView::new(
            assignment.clone(),
            test.map(|t| t.title.clone()),
            test.map(|t| t.description.clone()),
            self.profiles.get(&assignment.leader_id).map(Profile::summary),
        )
    }

    fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> bool {
        self.profiles
            .get(&user_id)
            .is_some_and(|p| p.organization_id == organization_id)
    }

    fn members(&self, organization_id: Uuid, role: Role) -> impl Iterator<Item = &Profile> {
        self.profiles
            .values()
            .filter(move |p| p.organization_id == organization_id && p.role == role)
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn insert_test(&self, test: &Test) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.tests.contains_key(&test.id) {
            return Err(conflict("test", test.id));
        }
        if state.tests.values().any(|t| t.slug == test.slug) {
            return Err(conflict("test slug", &test.slug));
        }
        state.tests.insert(test.id, test.clone());
        Ok(())
    }

    async fn get_test(&self, id: Uuid) -> Result<Option<Test>, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.tests.get(&id).cloned())
    }

    async fn get_test_by_slug(&self, slug: &str) -> Result<Option<Test>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        Ok(state.tests.values().find(|t| t.slug == slug).cloned())
    }

    async fn list_tests(&self, page: Pagination) -> Result<Page<TestSummary>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut tests: Vec<TestSummary> = state.tests.values().map(Test::summary).collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(tests, page))
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.assignments.contains_key(&assignment.id) {
            return Err(conflict("assignment", assignment.id));
        }
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.assignments.get(&id).cloned())
    }

    async fn list_assignments(
        &self,
        scope: AssignmentScope,
        page: Pagination,
    ) -> Result<Page<AssignmentView>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut rows: Vec<&Assignment> = state
            .assignments
            .values()
            .filter(|a| match scope {
                AssignmentScope::Organization(org) => a.organization_id == org,
                AssignmentScope::Assignee(user) => a.leader_id == user,
            })
            .collect();
        rows.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        let views = rows.into_iter().map(|a| state.assignment_view(a)).collect();
        Ok(page_of(views, page))
    }

    async fn count_assignments(
        &self,
        organization_id: Uuid,
        status: Option<AssignmentStatus>,
    ) -> Result<u64, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let count = state
            .assignments
            .values()
            .filter(|a| a.organization_id == organization_id)
            .filter(|a| status.map_or(true, |s| a.status() == s))
            .count();
        Ok(count as u64)
    }

    async fn mark_assignment_completed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Assignment>, StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        Ok(state.assignments.get_mut(&id).map(|a| {
            if a.completed_at.is_none() {
                a.completed_at = Some(at);
            }
            a.clone()
        }))
    }

    async fn get_result_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<AssessmentResult>, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.results.get(&assignment_id).cloned())
    }

    async fn insert_submission(&self, result: &AssessmentResult) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.results.contains_key(&result.assignment_id) {
            return Err(StoreError::Conflict(format!(
                "result for assignment {} already exists",
                result.assignment_id
            )));
        }
        let assignment = state
            .assignments
            .get_mut(&result.assignment_id)
            .ok_or_else(|| StoreError::Query(format!("assignment {} does not exist", result.assignment_id)))?;
        if assignment.completed_at.is_some() {
            return Err(StoreError::Conflict(format!(
                "assignment {} is already completed",
                result.assignment_id
            )));
        }
        assignment.completed_at = Some(result.created_at);
        state.results.insert(result.assignment_id, result.clone());
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.organizations.contains_key(&organization.id) {
            return Err(conflict("organization", organization.id));
        }
        state.organizations.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.profiles.contains_key(&profile.id) {
            return Err(conflict("profile", profile.id));
        }
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.profiles.get(&id).cloned())
    }

    async fn list_profiles(
        &self,
        organization_id: Uuid,
        role: Role,
        page: Pagination,
    ) -> Result<Page<Profile>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut profiles: Vec<Profile> = state.members(organization_id, role).cloned().collect();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(page_of(profiles, page))
    }

    async fn count_profiles(&self, organization_id: Uuid, role: Role) -> Result<u64, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        Ok(state.members(organization_id, role).count() as u64)
    }

    async fn profile_statuses(
        &self,
        organization_id: Uuid,
        role: Role,
    ) -> Result<Vec<Option<ProfileStatus>>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        Ok(state.members(organization_id, role).map(|p| p.status).collect())
    }

    async fn top_profiles_by_points(
        &self,
        organization_id: Uuid,
        role: Role,
        limit: u32,
    ) -> Result<Vec<Profile>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut profiles: Vec<Profile> = state.members(organization_id, role).cloned().collect();
        profiles.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.full_name.cmp(&b.full_name)));
        profiles.truncate(limit as usize);
        Ok(profiles)
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.invitations.iter().any(|i| i.token == invitation.token) {
            return Err(conflict("invitation token", &invitation.token));
        }
        state.invitations.push(invitation.clone());
        Ok(())
    }

    async fn list_invitations(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .iter()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn find_invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        Ok(state.invitations.iter().find(|i| i.token == token).cloned())
    }
}

#[async_trait]
impl GamificationStore for MemoryStore {
    async fn insert_achievement(&self, achievement: &Achievement) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.achievements.contains_key(&achievement.id) {
            return Err(conflict("achievement", achievement.id));
        }
        state.achievements.insert(achievement.id, achievement.clone());
        Ok(())
    }

    async fn list_achievements(&self, page: Pagination) -> Result<Page<Achievement>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut achievements: Vec<Achievement> = state.achievements.values().cloned().collect();
        achievements.sort_by(|a, b| a.points.cmp(&b.points).then_with(|| a.title.cmp(&b.title)));
        Ok(page_of(achievements, page))
    }

    async fn get_achievement(&self, id: Uuid) -> Result<Option<Achievement>, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.achievements.get(&id).cloned())
    }

    async fn count_achievements(&self) -> Result<u64, StoreError> {
        self.check_fault()?;
        Ok(self.state.read().await.achievements.len() as u64)
    }

    async fn award_achievement(&self, unlock: &UserAchievement, points: i32) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state
            .unlocks
            .iter()
            .any(|u| u.user_id == unlock.user_id && u.achievement_id == unlock.achievement_id)
        {
            return Err(StoreError::Conflict(format!(
                "achievement {} already awarded to {}",
                unlock.achievement_id, unlock.user_id
            )));
        }
        let profile = state
            .profiles
            .get_mut(&unlock.user_id)
            .ok_or_else(|| StoreError::Query(format!("profile {} does not exist", unlock.user_id)))?;
        profile.points = profile.points.saturating_add(points);
        state.unlocks.push(unlock.clone());
        Ok(())
    }

    async fn count_user_achievements(&self, user_id: Uuid) -> Result<u64, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        Ok(state.unlocks.iter().filter(|u| u.user_id == user_id).count() as u64)
    }

    async fn recent_unlocks(&self, organization_id: Uuid, limit: u32) -> Result<Vec<UnlockView>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut unlocks: Vec<&UserAchievement> = state
            .unlocks
            .iter()
            .filter(|u| state.is_member(u.user_id, organization_id))
            .collect();
        unlocks.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));

        let views = unlocks
            .into_iter()
            .filter_map(|u| {
                let achievement = state.achievements.get(&u.achievement_id)?.clone();
                let profile = state.profiles.get(&u.user_id);
                Some(UnlockView {
                    id: u.id,
                    user_id: u.user_id,
                    earned_at: u.earned_at,
                    achievement,
                    full_name: profile.and_then(|p| p.full_name.clone()),
                    avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                })
            })
            .take(limit as usize)
            .collect();
        Ok(views)
    }

    async fn insert_goal(&self, goal: &Goal) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut state = self.state.write().await;
        if state.goals.contains_key(&goal.id) {
            return Err(conflict("goal", goal.id));
        }
        state.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn list_goals(&self, organization_id: Uuid, page: Pagination) -> Result<Page<GoalView>, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let mut goals: Vec<&Goal> = state
            .goals
            .values()
            .filter(|g| state.is_member(g.user_id, organization_id))
            .collect();
        goals.sort_by(|a, b| a.deadline.cmp(&b.deadline));
        let views = goals
            .into_iter()
            .map(|g| GoalView {
                goal: g.clone(),
                profile: state.profiles.get(&g.user_id).map(Profile::summary),
            })
            .collect();
        Ok(page_of(views, page))
    }

    async fn count_goals(&self, user_id: Uuid, status: Option<GoalStatus>) -> Result<u64, StoreError> {
        self.check_fault()?;
        let state = self.state.read().await;
        let count = state
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .filter(|g| status.map_or(true, |s| g.status == s))
            .count();
        Ok(count as u64)
    }
}
