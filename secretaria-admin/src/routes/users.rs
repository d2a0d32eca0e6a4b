/// User management endpoints
///
/// # Endpoints
///
/// - `POST /auth/login` - Admin login by username (public)
/// - `GET /users?skip=&limit=` - List users (default 0/100, limit at most 500)
/// - `GET /users/:id` - Get one user
/// - `POST /users` - Create a user; username derived from the email when absent
/// - `PUT /users/:id` - Partial update
/// - `DELETE /users/:id` - Delete a user with their tasks and events
/// - `POST /users/:id/change-password` - Set a new password
///
/// Mutations are recorded in the audit log by the service layer.

use crate::app::AppState;
use axum::{extract::State, Extension};
use secretaria_shared::{
    auth::middleware::AuthContext,
    models::user::User,
    services::{
        users::{
            self, AdminCreateUserRequest, AdminLoginRequest, AdminLoginResponse,
            AdminUpdateUserRequest, ChangePasswordRequest,
        },
        MessageResponse, Pagination,
    },
    web::{
        error::ApiResult,
        extract::{Json, Path, Query},
    },
};
use uuid::Uuid;

/// Admin login
///
/// # Errors
///
/// - `401 Unauthorized`: Bad credentials or not an administrator
/// - `403 Forbidden`: Administrator account disabled
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> ApiResult<Json<AdminLoginResponse>> {
    Ok(Json(users::login(&state.db, &state.hasher, &state.tokens, req).await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(users::list(&state.db, page).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(users::get(&state.db, id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Json(req): Json<AdminCreateUserRequest>,
) -> ApiResult<Json<User>> {
    let user = users::create(&state.db, &state.hasher, admin.user.id, req).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(users::update(&state.db, admin.user.id, id, req).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(users::delete(&state.db, admin.user.id, id).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let response = users::change_password(&state.db, &state.hasher, admin.user.id, id, req).await?;
    Ok(Json(response))
}
