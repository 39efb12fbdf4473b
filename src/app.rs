use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::auth::{ConsentService, TokenConfig, TokenIssuer, TokenVerifier};
use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::repos::sqlite::SqliteIdentityRepo;
use crate::repos::{ConsentStore, CredentialStore, ServiceRegistry};
use crate::web::{handlers, middleware};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: DbPool,
    pub credentials: Arc<dyn CredentialStore>,
    pub registry: Arc<dyn ServiceRegistry>,
    pub consents: ConsentService,
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
}

impl AppState {
    pub fn new(config: AppConfig, pool: DbPool) -> anyhow::Result<Self> {
        let token_config = TokenConfig::from_app_config(&config)?;
        let repo = SqliteIdentityRepo::new(pool.clone());
        let credentials: Arc<dyn CredentialStore> = repo.clone();
        let registry: Arc<dyn ServiceRegistry> = repo.clone();
        let consent_store: Arc<dyn ConsentStore> = repo;
        let consents = ConsentService::new(consent_store);
        let issuer = TokenIssuer::new(token_config.clone(), registry.clone(), consents.clone());
        let verifier = TokenVerifier::new(token_config);
        Ok(Self { config, pool, credentials, registry, consents, issuer, verifier })
    }
}

pub async fn run() -> anyhow::Result<()> {
    // logging
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let config = AppConfig::load()?;

    let pool = db::init_pool(&config.db.url)?;
    {
        let mut conn = pool.get()?;
        db::run_migrations(&mut conn)?;
    }

    let state = AppState::new(config.clone(), pool)?;
    let app = build_router(state);

    let addr = config.server.bind_addr.clone();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/users/me", get(handlers::users::me))
        .route("/api/auth/password", post(handlers::auth::change_password))
        .route(
            "/api/consents/{service_identifier}",
            get(handlers::consent::get_consent)
                .post(handlers::consent::grant_consent)
                .delete(handlers::consent::revoke_consent),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_token,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/authenticate", post(handlers::auth::authenticate))
        .route("/api/services", get(handlers::services::list_services))
        .merge(protected)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
