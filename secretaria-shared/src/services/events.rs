/// Owner-scoped calendar event operations

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{check_max_chars, clean_optional, MAX_LOCATION_CHARS};
use crate::error::{ServiceError, ServiceResult};
use crate::models::event::{CreateEvent, Event, UpdateEvent};

const EVENT_NOT_FOUND: &str = "Event not found";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub event_date: DateTime<Utc>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[serde(default)]
    pub is_all_day: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,

    pub event_date: Option<DateTime<Utc>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub location: Option<Option<String>>,

    pub is_all_day: Option<bool>,
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(EVENT_NOT_FOUND.to_string())
}

pub async fn list(pool: &PgPool, owner_id: Uuid) -> ServiceResult<Vec<Event>> {
    Ok(Event::list_for_owner(pool, owner_id).await?)
}

pub async fn get(pool: &PgPool, owner_id: Uuid, id: Uuid) -> ServiceResult<Event> {
    Event::find_for_owner(pool, owner_id, id)
        .await?
        .ok_or_else(not_found)
}

pub async fn create(pool: &PgPool, owner_id: Uuid, request: CreateEventRequest) -> ServiceResult<Event> {
    request.validate()?;

    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ServiceError::field("title", "Title must not be blank"));
    }

    let event = Event::create(
        pool,
        owner_id,
        CreateEvent {
            title,
            description: clean_optional(request.description),
            event_date: request.event_date,
            location: clean_optional(request.location),
            is_all_day: request.is_all_day,
        },
    )
    .await?;

    info!(event_id = %event.id, owner_id = %owner_id, "Event created");
    Ok(event)
}

pub async fn update(
    pool: &PgPool,
    owner_id: Uuid,
    id: Uuid,
    request: UpdateEventRequest,
) -> ServiceResult<Event> {
    request.validate()?;

    let title = request.title.map(|t| t.trim().to_string());
    if title.as_deref() == Some("") {
        return Err(ServiceError::field("title", "Title must not be blank"));
    }

    let location = request.location.map(clean_optional);
    check_max_chars(
        "location",
        "Location",
        location.as_ref().and_then(Option::as_deref),
        MAX_LOCATION_CHARS,
    )?;

    let event = Event::update_for_owner(
        pool,
        owner_id,
        id,
        UpdateEvent {
            title,
            description: request.description.map(clean_optional),
            event_date: request.event_date,
            location,
            is_all_day: request.is_all_day,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    info!(event_id = %event.id, "Event updated");
    Ok(event)
}

pub async fn delete(pool: &PgPool, owner_id: Uuid, id: Uuid) -> ServiceResult<()> {
    if !Event::delete_for_owner(pool, owner_id, id).await? {
        return Err(not_found());
    }

    info!(event_id = %id, "Event deleted");
    Ok(())
}
