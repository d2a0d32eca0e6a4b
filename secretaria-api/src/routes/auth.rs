/// Authentication endpoints
///
/// This module provides account endpoints:
/// - Registration and login
/// - The caller's own profile
/// - Password recovery by emailed code
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get a bearer token
/// - `GET /api/auth/me` - Current user profile
/// - `PUT /api/auth/me` - Partial profile update
/// - `POST /api/auth/forgot-password` - Email a 6-digit reset code
/// - `POST /api/auth/reset-password` - Set a new password with a code
///
/// The handlers only extract and delegate; the logic lives in
/// `secretaria_shared::services::accounts`.

use crate::app::AppState;
use axum::{extract::State, Extension};
use secretaria_shared::{
    auth::middleware::AuthContext,
    models::user::User,
    services::{
        accounts::{
            self, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
            TokenResponse, UpdateProfileRequest,
        },
        MessageResponse,
    },
    web::{error::ApiResult, extract::Json},
};

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "alice@example.com",
///   "username": "alice",
///   "password": "SecureP@ss123",
///   "full_name": "Alice"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid input, or email/username already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<User>> {
    let user = accounts::register(&state.db, &state.hasher, req).await?;
    Ok(Json(user))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (same message)
/// - `403 Forbidden`: Account disabled
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = accounts::login(&state.db, &state.hasher, &state.tokens, req).await?;
    Ok(Json(token))
}

/// Current user profile
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Partial update of the current user's profile
///
/// Absent fields are untouched; `null` clears `full_name` or `phone_number`.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = accounts::update_profile(&state.db, auth.user.id, req).await?;
    Ok(Json(user))
}

/// Request a reset code
///
/// The response is identical whether or not the email is registered.
///
/// # Errors
///
/// - `500 Internal Server Error`: The code could not be delivered
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let response = accounts::forgot_password(&state.db, state.notifier.as_ref(), req).await?;
    Ok(Json(response))
}

/// Reset the password with an emailed code
///
/// # Errors
///
/// - `400 Bad Request`: Invalid, expired or already used code
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let response = accounts::reset_password(&state.db, &state.hasher, req).await?;
    Ok(Json(response))
}
