use std::str::FromStr;

use talentgate_application::{CreateUserGrantInput, GrantAdminRepository, UserGrantEntry};
use talentgate_domain::{PermissionAction, PermissionCategory, ResourceScope, RoleGrant, UserGrant};
use tracing::{debug, warn};

use super::*;

#[derive(Debug, FromRow)]
struct UserGrantEntryRow {
    #[sqlx(flatten)]
    grant: UserGrantRow,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

pub(super) fn decode_grant(row: UserGrantRow) -> AppResult<UserGrant> {
    let grant_id = row.id.to_string();
    let decode_error = |error: AppError| {
        AppError::Internal(format!(
            "failed to decode permission override '{grant_id}': {error}"
        ))
    };

    let category = row
        .category
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation("missing category".to_owned()))
        .and_then(PermissionCategory::from_str)
        .map_err(decode_error)?;
    let action = row
        .action
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation("missing action".to_owned()))
        .and_then(PermissionAction::from_str)
        .map_err(decode_error)?;
    let resource = row
        .resource
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(ResourceScope::new)
        .transpose()
        .map_err(decode_error)?;

    Ok(UserGrant {
        grant_id,
        user_id: UserId::from_uuid(row.user_id),
        category,
        action,
        resource,
        granted: row.granted,
        expires_at: row.expires_at,
        conditions: row.conditions,
    })
}

#[async_trait]
impl GrantAdminRepository for PostgresGrantRepository {
    async fn create_user_grant(
        &self,
        created_by: UserId,
        input: CreateUserGrantInput,
    ) -> AppResult<UserGrant> {
        let row = sqlx::query_as::<_, UserGrantRow>(
            r#"
            INSERT INTO user_permissions (
                id,
                user_id,
                category,
                action,
                resource,
                granted,
                expires_at,
                conditions,
                created_by
            )
            SELECT $1, users.id, $3, $4, $5, $6, $7, $8, $9
            FROM app_users AS users
            WHERE users.id = $2
            RETURNING id, user_id, category, action, resource, granted, expires_at, conditions
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id.as_uuid())
        .bind(input.permission.category.as_str())
        .bind(input.permission.action.as_str())
        .bind(
            input
                .permission
                .resource
                .as_ref()
                .map(|scope| scope.as_str().to_owned()),
        )
        .bind(input.granted)
        .bind(input.expires_at)
        .bind(input.conditions)
        .bind(created_by.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create permission override for user '{}': {error}",
                input.user_id
            ))
        })?
        .ok_or_else(|| AppError::NotFound(format!("user '{}' does not exist", input.user_id)))?;

        decode_grant(row)
    }

    async fn revoke_user_grant(&self, revoked_by: UserId, grant_id: &str) -> AppResult<()> {
        let grant_uuid = Uuid::parse_str(grant_id).map_err(|error| {
            AppError::Validation(format!("invalid grant id '{grant_id}': {error}"))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE user_permissions
            SET revoked_at = now(), revoked_by = $2
            WHERE id = $1
              AND revoked_at IS NULL
            "#,
        )
        .bind(grant_uuid)
        .bind(revoked_by.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to revoke permission override '{grant_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "active user grant '{grant_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn upsert_role_grant(&self, grant: RoleGrant) -> AppResult<RoleGrant> {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (id, role, category, action, resource, granted)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (role, category, action, (COALESCE(resource, '')))
            DO UPDATE SET granted = EXCLUDED.granted, updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(grant.role.as_str())
        .bind(grant.category.as_str())
        .bind(grant.action.as_str())
        .bind(grant.resource.as_ref().map(|scope| scope.as_str().to_owned()))
        .bind(grant.granted)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save grant '{}' for role '{}': {error}",
                grant.permission(),
                grant.role
            ))
        })?;

        debug!(role = %grant.role, permission = %grant.permission(), "upserted role grant");
        Ok(grant)
    }

    async fn list_user_grant_entries(&self, user_id: UserId) -> AppResult<Vec<UserGrantEntry>> {
        let rows = sqlx::query_as::<_, UserGrantEntryRow>(
            r#"
            SELECT
                id,
                user_id,
                category,
                action,
                resource,
                granted,
                expires_at,
                conditions,
                created_by,
                created_at,
                revoked_at
            FROM user_permissions
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list permission overrides for user '{user_id}': {error}"
            ))
        })?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            match decode_grant(row.grant) {
                Ok(grant) => entries.push(UserGrantEntry {
                    grant,
                    created_by: row.created_by.map(UserId::from_uuid),
                    created_at: row.created_at,
                    revoked_at: row.revoked_at,
                }),
                Err(error) => warn!(%user_id, %error, "skipping malformed user grant row"),
            }
        }

        Ok(entries)
    }
}
