use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use talentgate_application::{GrantAdminRepository, PolicyCacheConfig};
use talentgate_core::{Actor, Role, UserId};
use talentgate_domain::{Permission, RoleGrant};
use talentgate_infrastructure::InMemoryGrantRepository;
use tower::ServiceExt;

use crate::api_router::build_router;
use crate::middleware::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::state::AppState;

pub(crate) fn role(name: &str) -> Role {
    match Role::new(name) {
        Ok(role) => role,
        Err(error) => panic!("invalid test role '{name}': {error}"),
    }
}

/// Router over in-memory grant tables.
pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) repository: Arc<InMemoryGrantRepository>,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        let repository = Arc::new(InMemoryGrantRepository::new());
        let app_state = AppState::new(
            repository.clone(),
            repository.clone(),
            PolicyCacheConfig::default(),
        );

        Self {
            router: build_router(app_state),
            repository,
        }
    }

    /// Registers a stored user and returns an actor with the same session role.
    pub(crate) async fn actor(&self, role_name: &str) -> Actor {
        let user_id = UserId::new();
        self.repository.register_user(user_id, role(role_name)).await;
        Actor::new(user_id, role(role_name))
    }

    pub(crate) async fn grant_role(&self, role_name: &str, permission: &Permission) {
        let saved = self
            .repository
            .upsert_role_grant(RoleGrant {
                role: role(role_name),
                category: permission.category,
                action: permission.action,
                resource: permission.resource.clone(),
                granted: true,
            })
            .await;
        assert!(saved.is_ok());
    }

    /// Sends one request and returns the status with the decoded JSON body.
    pub(crate) async fn send(
        &self,
        method: Method,
        uri: &str,
        actor: Option<&Actor>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder
                .header(ACTOR_ID_HEADER, actor.user_id().to_string())
                .header(ACTOR_ROLE_HEADER, actor.role().as_str());
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        let request = match request {
            Ok(request) => request,
            Err(error) => panic!("failed to build test request: {error}"),
        };

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(error) => match error {},
        };
        let status = response.status();
        let bytes = match to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => panic!("failed to read response body: {error}"),
        };
        if bytes.is_empty() {
            return (status, Value::Null);
        }

        match serde_json::from_slice(&bytes) {
            Ok(value) => (status, value),
            Err(error) => panic!("response body was not JSON: {error}"),
        }
    }
}
