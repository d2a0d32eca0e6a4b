/// Application state and router builder for the admin server

use crate::{config::Config, routes};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use secretaria_shared::{
    auth::{
        jwt::TokenIssuer,
        middleware::{authorize, AuthGate, RequiredRole},
        password::PasswordHasher,
    },
    web::{cors_layer, security::SecurityHeadersLayer},
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    pub tokens: Arc<TokenIssuer>,
    pub hasher: Arc<PasswordHasher>,

    /// Process start, for the uptime in `/stats`
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            db,
            tokens: Arc::new(TokenIssuer::from_config(&config.jwt)),
            hasher: Arc::new(PasswordHasher::new(config.password)?),
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }
}

/// Builds the admin router
///
/// ```text
/// /
/// ├── GET  /                               # public
/// ├── GET  /health                         # public
/// ├── POST /auth/login                     # public, issues admin token
/// ├── GET|POST /users                      # admin
/// ├── GET|PUT|DELETE /users/:id            # admin
/// ├── POST /users/:id/change-password      # admin
/// ├── GET  /stats                          # admin
/// └── GET  /logs                           # admin
/// ```
pub fn build_router(state: AppState) -> Router {
    let gate = AuthGate::new(state.db.clone(), state.tokens.clone(), RequiredRole::Admin);

    let admin_routes = Router::new()
        .route("/users", get(routes::users::list_users).post(routes::users::create_user))
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/users/:id/change-password", post(routes::users::change_password))
        .route("/stats", get(routes::system::stats))
        .route("/logs", get(routes::system::logs))
        .route_layer(from_fn_with_state(gate, authorize));

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::users::login))
        .merge(admin_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(SecurityHeadersLayer::new(state.config.server.production))
        .with_state(state)
}
