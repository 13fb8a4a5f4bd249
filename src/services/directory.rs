use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{Invitation, Profile, ProfileStatus};
use crate::store::{call, CallPolicy, DirectoryStore, Store};
use crate::types::{Page, Pagination, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientStats {
    pub total: u64,
    pub active: u64,
    pub pending: u64,
    pub inactive: u64,
}

impl ClientStats {
    /// Profiles without a status count as active
    pub fn from_statuses(statuses: &[Option<ProfileStatus>]) -> Self {
        let mut stats = Self { total: statuses.len() as u64, ..Self::default() };
        for status in statuses {
            match status {
                Some(ProfileStatus::Pending) => stats.pending += 1,
                Some(ProfileStatus::Inactive) => stats.inactive += 1,
                Some(ProfileStatus::Active) | None => stats.active += 1,
            }
        }
        stats
    }
}

/// Organization members, viewed from the manager's side
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl Directory {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ServiceError> {
        let store = &self.store;
        call::read(&self.policy, "get_profile", || store.get_profile(user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("profile", user_id))
    }

    /// Ordered by full name
    pub async fn list_leaders(&self, organization_id: Uuid, pagination: Pagination) -> Result<Page<Profile>, ServiceError> {
        let store = &self.store;
        Ok(call::read(&self.policy, "list_profiles", || {
            store.list_profiles(organization_id, Role::Leader, pagination)
        })
        .await?)
    }

    pub async fn client_stats(&self, organization_id: Uuid) -> Result<ClientStats, ServiceError> {
        let store = &self.store;
        let statuses = call::read(&self.policy, "profile_statuses", || {
            store.profile_statuses(organization_id, Role::Leader)
        })
        .await?;
        Ok(ClientStats::from_statuses(&statuses))
    }
}

/// Outcome of checking an invitation token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    pub email: Option<String>,
    pub organization_id: Option<Uuid>,
    pub role: Option<Role>,
}

impl TokenValidation {
    fn invalid() -> Self {
        Self { valid: false, email: None, organization_id: None, role: None }
    }
}

#[derive(Clone)]
pub struct Invitations {
    store: Arc<dyn Store>,
    policy: CallPolicy,
    ttl: Duration,
}

impl Invitations {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy, ttl_hours: i64) -> Self {
        Self { store, policy, ttl: Duration::hours(ttl_hours) }
    }

    /// Invite a leader into the organization. Delivering the link is up to
    /// the caller.
    pub async fn create(&self, email: &str, organization_id: Uuid) -> Result<Invitation, ServiceError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::Invalid(format!("'{}' is not an email address", email)));
        }

        let invitation = Invitation::leader(email.to_lowercase(), organization_id, self.ttl);
        call::write(&self.policy, "insert_invitation", self.store.insert_invitation(&invitation)).await?;
        info!(invitation_id = %invitation.id, %organization_id, "created invitation");
        Ok(invitation)
    }

    /// Newest first
    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<Invitation>, ServiceError> {
        let store = &self.store;
        Ok(call::read(&self.policy, "list_invitations", || store.list_invitations(organization_id)).await?)
    }

    pub async fn validate_token(&self, token: &str) -> Result<TokenValidation, ServiceError> {
        let store = &self.store;
        let found = call::read(&self.policy, "find_invitation_by_token", || store.find_invitation_by_token(token)).await?;
        Ok(match found {
            Some(inv) if !inv.is_expired(Utc::now()) => TokenValidation {
                valid: true,
                email: Some(inv.email),
                organization_id: Some(inv.organization_id),
                role: Some(inv.role),
            },
            _ => TokenValidation::invalid(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn unknown_status_counts_as_active() {
        let stats = ClientStats::from_statuses(&[
            Some(ProfileStatus::Active),
            None,
            Some(ProfileStatus::Pending),
            Some(ProfileStatus::Inactive),
            Some(ProfileStatus::Pending),
        ]);
        assert_eq!(stats, ClientStats { total: 5, active: 2, pending: 2, inactive: 1 });
    }

    #[tokio::test]
    async fn leaders_are_listed_by_name() {
        let store = Arc::new(MemoryStore::new());
        let org = Uuid::new_v4();
        for name in ["Carla", "Ana", "Bruno"] {
            let p = Profile::new(org, Role::Leader, name, format!("{}@example.com", name.to_lowercase()));
            store.insert_profile(&p).await.unwrap();
        }
        store.insert_profile(&Profile::new(org, Role::Manager, "Zed", "zed@example.com")).await.unwrap();

        let directory = Directory::new(store, CallPolicy::default());
        let page = directory.list_leaders(org, Pagination::default()).await.unwrap();
        let names: Vec<_> = page.items.iter().filter_map(|p| p.full_name.clone()).collect();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);
        assert_eq!(directory.client_stats(org).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn invitation_tokens_validate_until_expiry() {
        let store = Arc::new(MemoryStore::new());
        let org = Uuid::new_v4();
        let invitations = Invitations::new(store.clone(), CallPolicy::default(), 24 * 7);

        let inv = invitations.create("New.Leader@Example.com", org).await.unwrap();
        let check = invitations.validate_token(&inv.token).await.unwrap();
        assert!(check.valid);
        assert_eq!(check.email.as_deref(), Some("new.leader@example.com"));
        assert_eq!(check.role, Some(Role::Leader));

        assert!(!invitations.validate_token("nope").await.unwrap().valid);

        let expired = Invitations::new(store, CallPolicy::default(), 0);
        let inv = expired.create("late@example.com", org).await.unwrap();
        assert!(!expired.validate_token(&inv.token).await.unwrap().valid);
    }

    #[tokio::test]
    async fn rejects_malformed_email() {
        let invitations = Invitations::new(Arc::new(MemoryStore::new()), CallPolicy::default(), 1);
        assert!(matches!(
            invitations.create("not-an-email", Uuid::new_v4()).await,
            Err(ServiceError::Invalid(_))
        ));
    }
}
