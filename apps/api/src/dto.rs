use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use talentgate_application::{Explanation, GateState, UserGrantEntry};
use talentgate_domain::{Permission, Resolution, RoleGrant, UserGrant};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for a gate check on the calling actor.
#[derive(Debug, Deserialize)]
pub struct AccessCheckRequest {
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub require_all: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Wait for grants instead of reporting `pending`.
    #[serde(default)]
    pub wait: bool,
}

/// Gate outcome for a check.
#[derive(Debug, Serialize)]
pub struct AccessCheckResponse {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_permissions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl From<GateState> for AccessCheckResponse {
    fn from(value: GateState) -> Self {
        let empty = Self {
            state: "pending",
            message: None,
            missing_permissions: Vec::new(),
            missing_roles: Vec::new(),
            error: None,
        };

        match value {
            GateState::Pending => empty,
            GateState::Granted => Self {
                state: "granted",
                ..empty
            },
            GateState::Denied(denial) => Self {
                state: "denied",
                message: Some(denial.to_string()),
                missing_permissions: denial
                    .missing_permissions
                    .iter()
                    .map(Permission::as_transport)
                    .collect(),
                missing_roles: denial
                    .missing_roles
                    .iter()
                    .map(|role| role.as_str().to_owned())
                    .collect(),
                ..empty
            },
            GateState::Errored(kind) => Self {
                state: "errored",
                message: Some(format!("unable to verify access: {kind}")),
                error: Some(kind.as_str()),
                ..empty
            },
        }
    }
}

/// Incoming payload for explaining one check.
#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub permission: String,
}

/// Deciding rule for one check.
#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub granted: bool,
    pub resolution: Resolution,
    pub diagnostics: Vec<&'static str>,
}

impl From<Explanation> for ExplainResponse {
    fn from(value: Explanation) -> Self {
        Self {
            granted: value.verdict.granted,
            resolution: value.resolution,
            diagnostics: value
                .diagnostics
                .iter()
                .map(|kind| kind.as_str())
                .collect(),
        }
    }
}

/// API representation of a catalogued permission.
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub permission: String,
    pub category: &'static str,
    pub action: &'static str,
    pub resource: Option<String>,
}

impl From<&Permission> for PermissionResponse {
    fn from(value: &Permission) -> Self {
        Self {
            permission: value.as_transport(),
            category: value.category.as_str(),
            action: value.action.as_str(),
            resource: value
                .resource
                .as_ref()
                .map(|scope| scope.as_str().to_owned()),
        }
    }
}

/// Incoming payload for a user-specific override.
#[derive(Debug, Deserialize)]
pub struct CreateUserGrantRequest {
    pub user_id: String,
    pub permission: String,
    #[serde(default = "default_granted")]
    pub granted: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub conditions: Option<Value>,
}

/// Incoming payload for a role baseline.
#[derive(Debug, Deserialize)]
pub struct SetRoleGrantRequest {
    pub role: String,
    pub permission: String,
    pub granted: bool,
}

fn default_granted() -> bool {
    true
}

/// API representation of a user override.
#[derive(Debug, Serialize)]
pub struct UserGrantResponse {
    pub grant_id: String,
    pub user_id: String,
    pub permission: String,
    pub granted: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub conditions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<UserGrant> for UserGrantResponse {
    fn from(value: UserGrant) -> Self {
        Self {
            permission: value.permission().as_transport(),
            grant_id: value.grant_id,
            user_id: value.user_id.to_string(),
            granted: value.granted,
            expires_at: value.expires_at,
            conditions: value.conditions,
            created_by: None,
            created_at: None,
            revoked_at: None,
        }
    }
}

impl From<UserGrantEntry> for UserGrantResponse {
    fn from(value: UserGrantEntry) -> Self {
        Self {
            created_by: value.created_by.map(|user_id| user_id.to_string()),
            created_at: Some(value.created_at),
            revoked_at: value.revoked_at,
            ..Self::from(value.grant)
        }
    }
}

/// API representation of a role baseline.
#[derive(Debug, Serialize)]
pub struct RoleGrantResponse {
    pub role: String,
    pub permission: String,
    pub granted: bool,
}

impl From<RoleGrant> for RoleGrantResponse {
    fn from(value: RoleGrant) -> Self {
        Self {
            permission: value.permission().as_transport(),
            role: value.role.as_str().to_owned(),
            granted: value.granted,
        }
    }
}

#[cfg(test)]
mod tests {
    use talentgate_application::{AccessDenial, GateState};
    use talentgate_domain::{AccessErrorKind, catalog};

    use super::{AccessCheckResponse, CreateUserGrantRequest, PermissionResponse};

    #[test]
    fn denial_lists_missing_permissions_in_transport_form() {
        let response = AccessCheckResponse::from(GateState::Denied(AccessDenial {
            missing_roles: Vec::new(),
            missing_permissions: vec![catalog::JOBS_UPDATE_OWN],
            require_all: true,
        }));

        assert_eq!(response.state, "denied");
        assert_eq!(response.missing_permissions, vec!["JOBS.UPDATE:own".to_owned()]);
        assert!(
            response
                .message
                .is_some_and(|message| message.contains("JOBS.UPDATE:own"))
        );
    }

    #[test]
    fn pending_and_errored_carry_no_denial() {
        let pending = AccessCheckResponse::from(GateState::Pending);
        assert_eq!(pending.state, "pending");
        assert!(pending.message.is_none());

        let errored =
            AccessCheckResponse::from(GateState::Errored(AccessErrorKind::StoreUnavailable));
        assert_eq!(errored.state, "errored");
        assert!(errored.missing_permissions.is_empty());
        assert_eq!(errored.error, Some(AccessErrorKind::StoreUnavailable.as_str()));
    }

    #[test]
    fn permission_response_splits_descriptor() {
        let response = PermissionResponse::from(&catalog::USER_READ_OWN_PROFILE);

        assert_eq!(response.category, "USER");
        assert_eq!(response.action, "READ");
        assert_eq!(response.resource.as_deref(), Some("own_profile"));
    }

    #[test]
    fn override_request_defaults_to_granting() {
        let request = serde_json::from_str::<CreateUserGrantRequest>(
            r#"{"user_id":"0b7f3c8e-58f5-4c8c-9d6e-6ab1a1b0e001","permission":"ai.use"}"#,
        );

        assert!(request.is_ok_and(|request| request.granted && request.expires_at.is_none()));
    }
}
