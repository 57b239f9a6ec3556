use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Builds every API route over shared state.
///
/// Routes under the protected router need the actor headers and pass through
/// the route access table before reaching their handler.
pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/access/check",
            post(handlers::access::check_access_handler),
        )
        .route(
            "/api/access/explain",
            post(handlers::access::explain_access_handler),
        )
        .route(
            "/api/admin/user-grants",
            post(handlers::admin::create_user_grant_handler),
        )
        .route(
            "/api/admin/user-grants/{grant_id}",
            delete(handlers::admin::revoke_user_grant_handler),
        )
        .route(
            "/api/admin/role-grants",
            put(handlers::admin::set_role_grant_handler),
        )
        .route(
            "/api/admin/users/{user_id}/grants",
            get(handlers::admin::list_user_grants_handler),
        )
        .route_layer(from_fn_with_state(app_state.clone(), middleware::route_gate))
        .route_layer(from_fn(middleware::require_actor));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/access/permissions",
            get(handlers::access::list_permissions_handler),
        )
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
