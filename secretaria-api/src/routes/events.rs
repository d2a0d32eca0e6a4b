/// Calendar event endpoints
///
/// Same ownership rules as tasks. Listing is ordered by `event_date`
/// ascending so the next event comes first.

use crate::app::AppState;
use axum::{extract::State, Extension};
use secretaria_shared::{
    auth::middleware::AuthContext,
    models::event::Event,
    services::{
        events::{self, CreateEventRequest, UpdateEventRequest},
        MessageResponse,
    },
    web::{
        error::ApiResult,
        extract::{Json, Path},
    },
};
use uuid::Uuid;

pub async fn list_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(events::list(&state.db, auth.user.id).await?))
}

pub async fn get_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    Ok(Json(events::get(&state.db, auth.user.id, id).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<Json<Event>> {
    Ok(Json(events::create(&state.db, auth.user.id, req).await?))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    Ok(Json(events::update(&state.db, auth.user.id, id, req).await?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    events::delete(&state.db, auth.user.id, id).await?;
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}
