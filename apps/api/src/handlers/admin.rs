use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use talentgate_application::{CreateUserGrantInput, SetRoleGrantInput};
use talentgate_core::{Actor, Role, UserId};
use talentgate_domain::Permission;

use crate::dto::{
    CreateUserGrantRequest, RoleGrantResponse, SetRoleGrantRequest, UserGrantResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_user_grant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateUserGrantRequest>,
) -> ApiResult<(StatusCode, Json<UserGrantResponse>)> {
    let grant = state
        .grant_admin_service
        .grant_user_permission(
            &actor,
            CreateUserGrantInput {
                user_id: UserId::from_str(payload.user_id.as_str())?,
                permission: Permission::parse(payload.permission.as_str())?,
                granted: payload.granted,
                expires_at: payload.expires_at,
                conditions: payload.conditions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserGrantResponse::from(grant))))
}

pub async fn revoke_user_grant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(grant_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .grant_admin_service
        .revoke_user_grant(&actor, grant_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_role_grant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SetRoleGrantRequest>,
) -> ApiResult<Json<RoleGrantResponse>> {
    let grant = state
        .grant_admin_service
        .set_role_grant(
            &actor,
            SetRoleGrantInput {
                role: Role::new(payload.role.as_str())?,
                permission: Permission::parse(payload.permission.as_str())?,
                granted: payload.granted,
            },
        )
        .await?;

    Ok(Json(RoleGrantResponse::from(grant)))
}

pub async fn list_user_grants_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<UserGrantResponse>>> {
    let grants = state
        .grant_admin_service
        .list_user_grants(&actor, UserId::from_str(user_id.as_str())?)
        .await?
        .into_iter()
        .map(UserGrantResponse::from)
        .collect();

    Ok(Json(grants))
}

#[cfg(test)]
mod tests;
