//! Talentgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use talentgate_application::{GrantAdminRepository, GrantRepository};
use talentgate_core::{AppError, Role};
use talentgate_infrastructure::{InMemoryGrantRepository, PostgresGrantRepository};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::middleware::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::state::AppState;

type GrantRepositories = (Arc<dyn GrantRepository>, Arc<dyn GrantAdminRepository>);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let Some((grant_repository, grant_admin_repository)) = build_repositories(&config).await?
    else {
        info!("database migrations applied successfully");
        return Ok(());
    };

    let app_state = AppState::new(grant_repository, grant_admin_repository, config.cache);

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(ACTOR_ID_HEADER),
            HeaderName::from_static(ACTOR_ROLE_HEADER),
        ]);

    let app = build_router(app_state).layer(cors_layer);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "talentgate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

/// Returns `None` when only migrations were requested.
async fn build_repositories(config: &ApiConfig) -> Result<Option<GrantRepositories>, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; grants are kept in memory and lost on restart");

        let repository = Arc::new(InMemoryGrantRepository::new());
        if let Some(admin_id) = config.dev_admin_user_id {
            repository.register_user(admin_id, Role::admin()).await;
            info!(user_id = %admin_id, "registered development admin user");
        }

        let grant_repository: Arc<dyn GrantRepository> = repository.clone();
        let grant_admin_repository: Arc<dyn GrantAdminRepository> = repository;
        return Ok(Some((grant_repository, grant_admin_repository)));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        return Ok(None);
    }

    let repository = Arc::new(PostgresGrantRepository::new(pool));
    let grant_repository: Arc<dyn GrantRepository> = repository.clone();
    let grant_admin_repository: Arc<dyn GrantAdminRepository> = repository;
    Ok(Some((grant_repository, grant_admin_repository)))
}
