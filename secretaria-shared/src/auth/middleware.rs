/// Authorization gate for Axum
///
/// Every protected route runs the same per-request state machine:
///
/// ```text
/// Unauthenticated → TokenPresent → TokenValid → UserActive → Authorized
/// ```
///
/// | Step failure                        | Status |
/// |-------------------------------------|--------|
/// | header missing or not `Bearer`      | 401    |
/// | bad signature, expired              | 401    |
/// | subject not found                   | 401    |
/// | user inactive                       | 403    |
/// | admin route, user not admin         | 403    |
/// | admin route, admin with app token   | 401    |
///
/// Nothing is cached: the user row is loaded on every request, so
/// deactivating an account takes effect immediately even for live tokens.
///
/// # Request Extensions
///
/// On success the gate inserts an [`AuthContext`] holding the loaded user.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use secretaria_shared::auth::jwt::TokenIssuer;
/// use secretaria_shared::auth::middleware::{authorize, AuthContext, AuthGate, RequiredRole};
/// use sqlx::PgPool;
///
/// async fn me(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.user.username)
/// }
///
/// fn router(pool: PgPool, tokens: Arc<TokenIssuer>) -> Router {
///     let gate = AuthGate::new(pool, tokens, RequiredRole::User);
///
///     Router::new()
///         .route("/me", get(me))
///         .layer(middleware::from_fn_with_state(gate, authorize))
/// }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error, warn};

use super::jwt::{JwtError, TokenIssuer, TokenScope};
use crate::models::user::User;

/// Role a route group demands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    /// Any active user; tokens of either scope are accepted
    User,

    /// Active admin holding an admin-scoped token
    Admin,
}

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User row loaded for this request
    pub user: User,

    /// Scope of the presented token
    pub scope: TokenScope,
}

/// Gate rejection
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Token subject no longer exists
    #[error("User not found")]
    UnknownUser,

    #[error("Inactive user")]
    Inactive,

    #[error("Admin privileges required")]
    NotAdmin,

    #[error("Database error: {0}")]
    Database(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::InvalidFormat(_)
            | AuthError::InvalidToken(_)
            | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
            AuthError::Inactive | AuthError::NotAdmin => StatusCode::FORBIDDEN,
            AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (code, message) = match &self {
            AuthError::Database(detail) => {
                error!(error = %detail, "Authorization lookup failed");
                ("internal_error", "An internal error occurred".to_string())
            }
            AuthError::Inactive | AuthError::NotAdmin => ("forbidden", self.to_string()),
            _ => ("unauthorized", "Could not validate credentials".to_string()),
        };

        let mut response = (status, Json(json!({ "error": code, "message": message }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

/// State handed to [`authorize`]
#[derive(Clone)]
pub struct AuthGate {
    pool: PgPool,
    tokens: Arc<TokenIssuer>,
    role: RequiredRole,
}

impl AuthGate {
    pub fn new(pool: PgPool, tokens: Arc<TokenIssuer>, role: RequiredRole) -> Self {
        Self { pool, tokens, role }
    }

    /// Runs the whole state machine against request headers
    ///
    /// The role checks run before the scope check, so a regular user holding
    /// an app token gets 403 on admin routes while an admin presenting an
    /// app token gets 401 and must sign in through the admin login.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = bearer_token(headers)?;

        let claims = self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            match e {
                JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
                other => AuthError::InvalidToken(other.to_string()),
            }
        })?;

        let user = User::find_by_id(&self.pool, claims.sub)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "Token subject does not exist");
                AuthError::UnknownUser
            })?;

        check_access(&user, self.role)?;
        check_scope(claims.scope, self.role)?;

        Ok(AuthContext {
            user,
            scope: claims.scope,
        })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid UTF-8".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Active and role checks on a resolved user
pub fn check_access(user: &User, role: RequiredRole) -> Result<(), AuthError> {
    if !user.is_active {
        return Err(AuthError::Inactive);
    }

    if role == RequiredRole::Admin && !user.is_admin {
        return Err(AuthError::NotAdmin);
    }

    Ok(())
}

/// Scope check, applied after the user passed [`check_access`]
pub fn check_scope(scope: TokenScope, role: RequiredRole) -> Result<(), AuthError> {
    if role == RequiredRole::Admin && scope != TokenScope::Admin {
        return Err(AuthError::InvalidToken(
            "Admin routes require a token from the admin login".to_string(),
        ));
    }

    Ok(())
}

/// Middleware entry point for `axum::middleware::from_fn_with_state`
pub async fn authorize(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = gate.authenticate(req.headers()).await?;

    debug!(user_id = %context.user.id, role = ?gate.role, "Request authorized");
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
