use axum::Json;
use axum::extract::{Extension, State};
use talentgate_application::AccessRequirement;
use talentgate_core::{Actor, AppResult, Role};
use talentgate_domain::catalog;

use crate::dto::{
    AccessCheckRequest, AccessCheckResponse, ExplainRequest, ExplainResponse, PermissionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Gates the calling actor against a requirement.
///
/// Permissions may name any key a grant can carry, so `JOBS.UPDATE:all` and
/// the unscoped `JOBS.UPDATE` are accepted next to catalogued descriptors.
pub async fn check_access_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<AccessCheckRequest>,
) -> ApiResult<Json<AccessCheckResponse>> {
    let requirement = requirement_from_request(&payload)?;

    let gate_state = if payload.wait {
        state.access_gate.check_settled(&actor, &requirement).await
    } else {
        state.access_gate.check(&actor, &requirement).await
    };

    Ok(Json(AccessCheckResponse::from(gate_state)))
}

pub async fn explain_access_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ExplainRequest>,
) -> ApiResult<Json<ExplainResponse>> {
    let permission = catalog::lookup_grant_key(payload.permission.as_str())?;
    let explanation = state.policy_evaluator.explain(&actor, &permission).await?;

    Ok(Json(ExplainResponse::from(explanation)))
}

pub async fn list_permissions_handler() -> Json<Vec<PermissionResponse>> {
    Json(catalog::all().iter().map(PermissionResponse::from).collect())
}

fn requirement_from_request(payload: &AccessCheckRequest) -> AppResult<AccessRequirement> {
    let permissions = payload
        .permissions
        .iter()
        .map(|value| catalog::lookup_grant_key(value.as_str()))
        .collect::<AppResult<Vec<_>>>()?;
    let roles = payload
        .roles
        .iter()
        .map(Role::new)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(AccessRequirement {
        permissions,
        require_all: payload.require_all,
        roles,
    })
}
