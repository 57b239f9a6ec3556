use std::str::FromStr;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use talentgate_core::{Actor, AppError, Role, UserId};

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the authenticated user id, set by the upstream session layer.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated user's session role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

pub async fn require_actor(mut request: Request, next: Next) -> ApiResult<Response> {
    let actor = actor_from_headers(request.headers())?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

pub async fn route_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(requirement) = state
        .route_access
        .requirement_for(request.uri().path())
        .cloned()
    else {
        return Ok(next.run(request).await);
    };

    let actor = request
        .extensions()
        .get::<Actor>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let response = state
        .access_gate
        .guard(&actor, &requirement, || async move { Ok(next.run(request).await) })
        .await?;

    Ok(response)
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = header_value(headers, ACTOR_ID_HEADER)?;
    let role = header_value(headers, ACTOR_ROLE_HEADER)?;

    Ok(Actor::new(UserId::from_str(user_id)?, Role::new(role)?))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {name} header")))
}
