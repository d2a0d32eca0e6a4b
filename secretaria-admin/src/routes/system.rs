/// System monitoring endpoints
///
/// - `GET /stats` - live counts and process uptime
/// - `GET /logs?skip=&limit=` - audit entries, newest first

use crate::app::AppState;
use axum::extract::State;
use secretaria_shared::{
    models::system_log::SystemLog,
    services::{
        audit::{self, SystemStats},
        Pagination,
    },
    web::{
        error::ApiResult,
        extract::{Json, Query},
    },
};

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<SystemStats>> {
    Ok(Json(audit::stats(&state.db, state.started_at).await?))
}

pub async fn logs(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<SystemLog>>> {
    Ok(Json(audit::logs(&state.db, page).await?))
}
