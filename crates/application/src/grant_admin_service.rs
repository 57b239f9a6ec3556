use std::sync::Arc;

use chrono::Utc;
use talentgate_core::{Actor, AppError, AppResult, UserId};
use talentgate_domain::{Permission, RoleGrant, UserGrant, catalog};
use tracing::info;

use crate::policy_evaluator::PolicyEvaluator;
use crate::policy_ports::{
    CreateUserGrantInput, GrantAdminRepository, SetRoleGrantInput, UserGrantEntry,
};

/// Application service for maintaining role baselines and user overrides.
#[derive(Clone)]
pub struct GrantAdminService {
    evaluator: PolicyEvaluator,
    repository: Arc<dyn GrantAdminRepository>,
}

impl GrantAdminService {
    /// Creates a new grant administration service.
    #[must_use]
    pub fn new(evaluator: PolicyEvaluator, repository: Arc<dyn GrantAdminRepository>) -> Self {
        Self {
            evaluator,
            repository,
        }
    }

    /// Records a user-specific override.
    pub async fn grant_user_permission(
        &self,
        actor: &Actor,
        input: CreateUserGrantInput,
    ) -> AppResult<UserGrant> {
        self.require_grant_manage_permission(actor).await?;
        ensure_recognized(&input.permission)?;

        if let Some(expires_at) = input.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::Validation(format!(
                "override expiry '{expires_at}' must lie in the future"
            )));
        }

        let grant = self
            .repository
            .create_user_grant(actor.user_id(), input)
            .await?;

        info!(
            admin_id = %actor.user_id(),
            user_id = %grant.user_id,
            grant_id = %grant.grant_id,
            permission = %grant.permission(),
            granted = grant.granted,
            "recorded user permission override"
        );

        Ok(grant)
    }

    /// Revokes a user-specific override.
    pub async fn revoke_user_grant(&self, actor: &Actor, grant_id: &str) -> AppResult<()> {
        self.require_grant_manage_permission(actor).await?;

        let grant_id = grant_id.trim();
        if grant_id.is_empty() {
            return Err(AppError::Validation(
                "grant_id must not be empty".to_owned(),
            ));
        }

        self.repository
            .revoke_user_grant(actor.user_id(), grant_id)
            .await?;

        info!(admin_id = %actor.user_id(), %grant_id, "revoked user permission override");
        Ok(())
    }

    /// Sets a role baseline, replacing any row with the same key.
    pub async fn set_role_grant(
        &self,
        actor: &Actor,
        input: SetRoleGrantInput,
    ) -> AppResult<RoleGrant> {
        self.require_grant_manage_permission(actor).await?;
        ensure_recognized(&input.permission)?;

        if input.role.is_admin() {
            return Err(AppError::Validation(
                "the admin role holds every permission and takes no grant rows".to_owned(),
            ));
        }

        let SetRoleGrantInput {
            role,
            permission,
            granted,
        } = input;
        let grant = self
            .repository
            .upsert_role_grant(RoleGrant {
                role,
                category: permission.category,
                action: permission.action,
                resource: permission.resource,
                granted,
            })
            .await?;

        info!(
            admin_id = %actor.user_id(),
            role = %grant.role,
            permission = %grant.permission(),
            granted = grant.granted,
            "set role permission"
        );

        Ok(grant)
    }

    /// Lists every override recorded for a user.
    pub async fn list_user_grants(
        &self,
        actor: &Actor,
        user_id: UserId,
    ) -> AppResult<Vec<UserGrantEntry>> {
        self.require_grant_manage_permission(actor).await?;
        self.repository.list_user_grant_entries(user_id).await
    }

    async fn require_grant_manage_permission(&self, actor: &Actor) -> AppResult<()> {
        self.evaluator
            .require_permission(actor, &catalog::ADMIN_MANAGE)
            .await
    }
}

fn ensure_recognized(permission: &Permission) -> AppResult<()> {
    if catalog::recognizes_grant_key(
        permission.category,
        permission.action,
        permission.resource.as_ref(),
    ) {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "permission '{permission}' is not part of the catalog"
    )))
}
