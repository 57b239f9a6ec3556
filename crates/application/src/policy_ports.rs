use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use talentgate_core::{AppResult, Role, UserId};
use talentgate_domain::{Permission, RoleGrant, UserGrant};

/// Role grant row as read from storage.
///
/// Category and action are optional because the backing table does not
/// enforce them; rows missing either are skipped during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrantRecord {
    /// Role name.
    pub role: String,
    /// Category storage value.
    pub category: Option<String>,
    /// Action storage value.
    pub action: Option<String>,
    /// Resource scope storage value.
    pub resource: Option<String>,
    /// Whether the role holds the permission.
    pub granted: bool,
}

/// User override row as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGrantRecord {
    /// Stable grant id.
    pub grant_id: String,
    /// User the override applies to.
    pub user_id: UserId,
    /// Category storage value.
    pub category: Option<String>,
    /// Action storage value.
    pub action: Option<String>,
    /// Resource scope storage value.
    pub resource: Option<String>,
    /// Whether the user holds the permission.
    pub granted: bool,
    /// Expiry instant, when the override is temporary.
    pub expires_at: Option<DateTime<Utc>>,
    /// Extra columns passed through untouched.
    pub conditions: Option<Value>,
}

/// Read port for the grant tables.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Returns the stored role for a user, or `None` when the id is unknown.
    async fn find_user_role(&self, user_id: UserId) -> AppResult<Option<Role>>;

    /// Lists grant rows for a role.
    async fn list_role_grants(&self, role: &Role) -> AppResult<Vec<RoleGrantRecord>>;

    /// Lists non-revoked override rows for a user, expired ones included.
    async fn list_user_grants(&self, user_id: UserId) -> AppResult<Vec<UserGrantRecord>>;
}

/// Input payload for a user-specific override.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserGrantInput {
    /// User receiving the override.
    pub user_id: UserId,
    /// Permission being overridden.
    pub permission: Permission,
    /// Whether the override grants or denies.
    pub granted: bool,
    /// Optional expiry; must lie in the future.
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque metadata stored alongside the override.
    pub conditions: Option<Value>,
}

/// Input payload for a role baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRoleGrantInput {
    /// Role receiving the grant.
    pub role: Role,
    /// Permission being granted or denied.
    pub permission: Permission,
    /// Whether the role holds the permission.
    pub granted: bool,
}

/// Administrative projection of a user override.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGrantEntry {
    /// Override as evaluated.
    pub grant: UserGrant,
    /// Admin who created the override, when recorded.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Revocation timestamp, when revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Write port used by grant administration.
///
/// Writes never touch the policy store cache; readers observe them once
/// their cached snapshot ages out.
#[async_trait]
pub trait GrantAdminRepository: Send + Sync {
    /// Persists a new user override.
    async fn create_user_grant(
        &self,
        created_by: UserId,
        input: CreateUserGrantInput,
    ) -> AppResult<UserGrant>;

    /// Marks a user override as revoked.
    async fn revoke_user_grant(&self, revoked_by: UserId, grant_id: &str) -> AppResult<()>;

    /// Inserts or replaces the role grant keyed by role, category, action and scope.
    async fn upsert_role_grant(&self, grant: RoleGrant) -> AppResult<RoleGrant>;

    /// Lists every override recorded for a user, revoked ones included.
    async fn list_user_grant_entries(&self, user_id: UserId) -> AppResult<Vec<UserGrantEntry>>;
}
