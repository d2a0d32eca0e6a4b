/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use secretaria_api::{app::AppState, config::Config};
/// use secretaria_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(&config.database).await?;
/// let state = AppState::new(pool, config)?;
/// let app = secretaria_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, routes};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use secretaria_shared::{
    auth::{
        jwt::TokenIssuer,
        middleware::{authorize, AuthGate, RequiredRole},
        password::PasswordHasher,
    },
    mail::{Mailer, Notifier},
    services::upload::{PhotoStore, MAX_UPLOAD_BYTES},
    web::{cors_layer, security::SecurityHeadersLayer},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Body limit on the upload routes
///
/// Larger than the photo limit so oversize files reach the size check and get
/// a proper validation error instead of a bare 413.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token signer/verifier built from `config.jwt`
    pub tokens: Arc<TokenIssuer>,

    /// Argon2 hasher built from `config.password`
    pub hasher: Arc<PasswordHasher>,

    /// Reset-code delivery
    pub notifier: Arc<dyn Notifier>,

    /// Profile photo directory
    pub photos: PhotoStore,
}

impl AppState {
    /// Creates new application state with the configured mailer
    ///
    /// # Errors
    ///
    /// Fails when the hash parameters are invalid or the mail transport
    /// cannot be built.
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(Mailer::new(&config.mail)?);

        Ok(Self {
            db,
            tokens: Arc::new(TokenIssuer::from_config(&config.jwt)),
            hasher: Arc::new(PasswordHasher::new(config.password)?),
            photos: PhotoStore::from_config(&config.upload),
            notifier,
            config: Arc::new(config),
        })
    }

    /// Replaces the notifier
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    fn gate(&self) -> AuthGate {
        AuthGate::new(self.db.clone(), self.tokens.clone(), RequiredRole::User)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                              # Welcome (public)
/// ├── GET  /health                        # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register              # public
///     │   ├── POST /login                 # public
///     │   ├── POST /forgot-password       # public
///     │   ├── POST /reset-password        # public
///     │   └── GET|PUT /me                 # authenticated
///     ├── /tasks/                         # authenticated, owner-scoped
///     │   ├── GET|POST /
///     │   ├── GET|PUT|DELETE /:id
///     │   └── PATCH /:id/toggle
///     ├── /events/                        # authenticated, owner-scoped
///     │   ├── GET|POST /
///     │   └── GET|PUT|DELETE /:id
///     └── /upload/
///         ├── POST|DELETE /profile-photo  # authenticated
///         └── GET /profile-photo/:filename  # public
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per route group)
pub fn build_router(state: AppState) -> Router {
    let gate = state.gate();
    let require_user = || from_fn_with_state(gate.clone(), authorize);

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me).put(routes::auth::update_me))
        .route_layer(require_user())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/toggle", patch(routes::tasks::toggle_task))
        .route_layer(require_user());

    let event_routes = Router::new()
        .route("/", get(routes::events::list_events).post(routes::events::create_event))
        .route(
            "/:id",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route_layer(require_user());

    let upload_routes = Router::new()
        .route(
            "/profile-photo",
            post(routes::upload::upload_profile_photo).delete(routes::upload::delete_profile_photo),
        )
        .route_layer(require_user())
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .route("/profile-photo/:filename", get(routes::upload::get_profile_photo));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/events", event_routes)
        .nest("/upload", upload_routes);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
