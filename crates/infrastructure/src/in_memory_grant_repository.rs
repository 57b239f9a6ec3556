use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use talentgate_application::{
    CreateUserGrantInput, GrantAdminRepository, GrantRepository, RoleGrantRecord, UserGrantEntry,
    UserGrantRecord,
};
use talentgate_core::{AppError, AppResult, Role, UserId};
use talentgate_domain::{RoleGrant, UserGrant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory grant tables implementing the read and admin ports.
#[derive(Debug, Default)]
pub struct InMemoryGrantRepository {
    users: RwLock<HashMap<UserId, Role>>,
    role_grants: RwLock<Vec<RoleGrant>>,
    user_grants: RwLock<Vec<UserGrantEntry>>,
}

impl InMemoryGrantRepository {
    /// Creates empty grant tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user with a stored role, replacing any previous role.
    pub async fn register_user(&self, user_id: UserId, role: Role) {
        self.users.write().await.insert(user_id, role);
    }
}

fn role_record(grant: &RoleGrant) -> RoleGrantRecord {
    RoleGrantRecord {
        role: grant.role.as_str().to_owned(),
        category: Some(grant.category.as_str().to_owned()),
        action: Some(grant.action.as_str().to_owned()),
        resource: grant.resource.as_ref().map(|scope| scope.as_str().to_owned()),
        granted: grant.granted,
    }
}

fn user_record(grant: &UserGrant) -> UserGrantRecord {
    UserGrantRecord {
        grant_id: grant.grant_id.clone(),
        user_id: grant.user_id,
        category: Some(grant.category.as_str().to_owned()),
        action: Some(grant.action.as_str().to_owned()),
        resource: grant.resource.as_ref().map(|scope| scope.as_str().to_owned()),
        granted: grant.granted,
        expires_at: grant.expires_at,
        conditions: grant.conditions.clone(),
    }
}

#[async_trait]
impl GrantRepository for InMemoryGrantRepository {
    async fn find_user_role(&self, user_id: UserId) -> AppResult<Option<Role>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn list_role_grants(&self, role: &Role) -> AppResult<Vec<RoleGrantRecord>> {
        Ok(self
            .role_grants
            .read()
            .await
            .iter()
            .filter(|grant| &grant.role == role)
            .map(role_record)
            .collect())
    }

    async fn list_user_grants(&self, user_id: UserId) -> AppResult<Vec<UserGrantRecord>> {
        Ok(self
            .user_grants
            .read()
            .await
            .iter()
            .filter(|entry| entry.grant.user_id == user_id && entry.revoked_at.is_none())
            .map(|entry| user_record(&entry.grant))
            .collect())
    }
}

#[async_trait]
impl GrantAdminRepository for InMemoryGrantRepository {
    async fn create_user_grant(
        &self,
        created_by: UserId,
        input: CreateUserGrantInput,
    ) -> AppResult<UserGrant> {
        if !self.users.read().await.contains_key(&input.user_id) {
            return Err(AppError::NotFound(format!(
                "user '{}' does not exist",
                input.user_id
            )));
        }

        let grant = UserGrant {
            grant_id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            category: input.permission.category,
            action: input.permission.action,
            resource: input.permission.resource,
            granted: input.granted,
            expires_at: input.expires_at,
            conditions: input.conditions,
        };

        self.user_grants.write().await.push(UserGrantEntry {
            grant: grant.clone(),
            created_by: Some(created_by),
            created_at: Utc::now(),
            revoked_at: None,
        });

        Ok(grant)
    }

    async fn revoke_user_grant(&self, _revoked_by: UserId, grant_id: &str) -> AppResult<()> {
        let mut user_grants = self.user_grants.write().await;
        let Some(entry) = user_grants
            .iter_mut()
            .find(|entry| entry.grant.grant_id == grant_id && entry.revoked_at.is_none())
        else {
            return Err(AppError::NotFound(format!(
                "active user grant '{grant_id}' does not exist"
            )));
        };

        entry.revoked_at = Some(Utc::now());
        Ok(())
    }

    async fn upsert_role_grant(&self, grant: RoleGrant) -> AppResult<RoleGrant> {
        let mut role_grants = self.role_grants.write().await;
        match role_grants.iter_mut().find(|existing| {
            existing.role == grant.role
                && existing.category == grant.category
                && existing.action == grant.action
                && existing.resource == grant.resource
        }) {
            Some(existing) => existing.granted = grant.granted,
            None => role_grants.push(grant.clone()),
        }

        Ok(grant)
    }

    async fn list_user_grant_entries(&self, user_id: UserId) -> AppResult<Vec<UserGrantEntry>> {
        let mut entries: Vec<UserGrantEntry> = self
            .user_grants
            .read()
            .await
            .iter()
            .filter(|entry| entry.grant.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        Ok(entries)
    }
}
