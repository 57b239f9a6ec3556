use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use talentgate_core::{Actor, Role, UserId};

use crate::permission::{
    Permission, PermissionAction, PermissionCategory, ResourceScope, scope_covers,
};

/// Baseline decision for every actor holding a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Role the grant applies to.
    pub role: Role,
    /// Feature area.
    pub category: PermissionCategory,
    /// Operation within the area.
    pub action: PermissionAction,
    /// Optional resource scope; `all` covers every requested scope.
    pub resource: Option<ResourceScope>,
    /// Whether the role holds the permission.
    pub granted: bool,
}

impl RoleGrant {
    /// Returns the descriptor this grant is keyed by.
    #[must_use]
    pub fn permission(&self) -> Permission {
        Permission {
            category: self.category,
            action: self.action,
            resource: self.resource.clone(),
        }
    }

    /// Returns whether this grant answers a check for the permission.
    #[must_use]
    pub fn covers(&self, permission: &Permission) -> bool {
        self.category == permission.category
            && self.action == permission.action
            && scope_covers(self.resource.as_ref(), permission.resource.as_ref())
    }
}

/// User-specific override of the role baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGrant {
    /// Stable grant id, used for revocation.
    pub grant_id: String,
    /// User the override applies to.
    pub user_id: UserId,
    /// Feature area.
    pub category: PermissionCategory,
    /// Operation within the area.
    pub action: PermissionAction,
    /// Optional resource scope; `all` covers every requested scope.
    pub resource: Option<ResourceScope>,
    /// Whether the user holds the permission.
    pub granted: bool,
    /// Instant after which the override no longer applies.
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque metadata carried from storage and never interpreted here.
    pub conditions: Option<Value>,
}

impl UserGrant {
    /// Returns the descriptor this override is keyed by.
    #[must_use]
    pub fn permission(&self) -> Permission {
        Permission {
            category: self.category,
            action: self.action,
            resource: self.resource.clone(),
        }
    }

    /// Returns whether this grant answers a check for the permission.
    #[must_use]
    pub fn covers(&self, permission: &Permission) -> bool {
        self.category == permission.category
            && self.action == permission.action
            && scope_covers(self.resource.as_ref(), permission.resource.as_ref())
    }

    /// Returns whether the override has lapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// How a single check was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Resolution {
    /// The actor is an administrator.
    AdminBypass,
    /// An unexpired user override decided.
    UserOverride {
        /// Override id.
        grant_id: String,
        /// Decision carried by the override.
        granted: bool,
    },
    /// A role grant decided.
    RoleDefault {
        /// Decision carried by the role grant.
        granted: bool,
    },
    /// Nothing matched; closed-world denial.
    NoMatchingGrant,
}

impl Resolution {
    /// Returns whether the resolution grants access.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        match self {
            Self::AdminBypass => true,
            Self::UserOverride { granted, .. } | Self::RoleDefault { granted } => *granted,
            Self::NoMatchingGrant => false,
        }
    }
}

/// Snapshot of every grant applicable to one actor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrantSet {
    /// Grants for the actor's stored role.
    pub role_grants: Vec<RoleGrant>,
    /// Overrides recorded for the actor's user id.
    pub user_grants: Vec<UserGrant>,
    /// False when the user id did not resolve to a known actor.
    pub actor_resolved: bool,
    /// Number of storage rows dropped because they lacked a usable key.
    pub skipped_rows: usize,
}

impl GrantSet {
    /// Creates a snapshot for a resolved actor.
    #[must_use]
    pub fn new(role_grants: Vec<RoleGrant>, user_grants: Vec<UserGrant>) -> Self {
        Self {
            role_grants,
            user_grants,
            actor_resolved: true,
            skipped_rows: 0,
        }
    }

    /// Creates the empty snapshot used for ids that do not resolve.
    #[must_use]
    pub fn unknown_actor() -> Self {
        Self {
            actor_resolved: false,
            ..Self::default()
        }
    }

    /// Resolves one permission for the actor at evaluation time `now`.
    ///
    /// Order: administrator bypass, first unexpired matching user override,
    /// first matching grant for the actor's role, then closed-world denial.
    /// Expired overrides are ignored entirely, whatever their decision.
    #[must_use]
    pub fn resolve(&self, actor: &Actor, permission: &Permission, now: DateTime<Utc>) -> Resolution {
        if actor.is_admin() {
            return Resolution::AdminBypass;
        }

        if let Some(grant) = self.user_grants.iter().find(|grant| {
            grant.user_id == actor.user_id() && grant.covers(permission) && !grant.is_expired_at(now)
        }) {
            return Resolution::UserOverride {
                grant_id: grant.grant_id.clone(),
                granted: grant.granted,
            };
        }

        self.role_grants
            .iter()
            .find(|grant| &grant.role == actor.role() && grant.covers(permission))
            .map(|grant| Resolution::RoleDefault {
                granted: grant.granted,
            })
            .unwrap_or(Resolution::NoMatchingGrant)
    }
}

#[cfg(test)]
mod tests;
