use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use talentgate_application::{GrantRepository, RoleGrantRecord, UserGrantRecord};
use talentgate_core::{AppError, AppResult, Role, UserId};
use uuid::Uuid;

mod admin;

/// PostgreSQL-backed repository for role baselines and user overrides.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    role: String,
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role: String,
    category: Option<String>,
    action: Option<String>,
    resource: Option<String>,
    granted: bool,
}

impl From<RoleGrantRow> for RoleGrantRecord {
    fn from(row: RoleGrantRow) -> Self {
        Self {
            role: row.role,
            category: row.category,
            action: row.action,
            resource: row.resource,
            granted: row.granted,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserGrantRow {
    id: Uuid,
    user_id: Uuid,
    category: Option<String>,
    action: Option<String>,
    resource: Option<String>,
    granted: bool,
    expires_at: Option<DateTime<Utc>>,
    conditions: Option<Value>,
}

impl From<UserGrantRow> for UserGrantRecord {
    fn from(row: UserGrantRow) -> Self {
        Self {
            grant_id: row.id.to_string(),
            user_id: UserId::from_uuid(row.user_id),
            category: row.category,
            action: row.action,
            resource: row.resource,
            granted: row.granted,
            expires_at: row.expires_at,
            conditions: row.conditions,
        }
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn find_user_role(&self, user_id: UserId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT role
            FROM app_users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load role for user '{user_id}': {error}"))
        })?;

        row.map(|row| {
            Role::new(row.role.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode stored role '{}' for user '{user_id}': {error}",
                    row.role
                ))
            })
        })
        .transpose()
    }

    async fn list_role_grants(&self, role: &Role) -> AppResult<Vec<RoleGrantRecord>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT role, category, action, resource, granted
            FROM role_permissions
            WHERE lower(btrim(role)) = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load grants for role '{role}': {error}"))
        })?;

        Ok(rows.into_iter().map(RoleGrantRecord::from).collect())
    }

    async fn list_user_grants(&self, user_id: UserId) -> AppResult<Vec<UserGrantRecord>> {
        let rows = sqlx::query_as::<_, UserGrantRow>(
            r#"
            SELECT id, user_id, category, action, resource, granted, expires_at, conditions
            FROM user_permissions
            WHERE user_id = $1
              AND revoked_at IS NULL
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load permission overrides for user '{user_id}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(UserGrantRecord::from).collect())
    }
}
