/// Task endpoints
///
/// Every handler runs behind the user gate and is scoped to the caller: a
/// task owned by someone else answers 404 exactly like a missing one.

use crate::app::AppState;
use axum::{extract::State, Extension};
use secretaria_shared::{
    auth::middleware::AuthContext,
    models::task::Task,
    services::{
        tasks::{self, CreateTaskRequest, UpdateTaskRequest},
        MessageResponse,
    },
    web::{
        error::ApiResult,
        extract::{Json, Path},
    },
};
use uuid::Uuid;

/// `GET /api/tasks`, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(tasks::list(&state.db, auth.user.id).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::get(&state.db, auth.user.id, id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::create(&state.db, auth.user.id, req).await?))
}

/// `PUT /api/tasks/:id`, partial update
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::update(&state.db, auth.user.id, id, req).await?))
}

/// `PATCH /api/tasks/:id/toggle`
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::toggle(&state.db, auth.user.id, id).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    tasks::delete(&state.db, auth.user.id, id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
