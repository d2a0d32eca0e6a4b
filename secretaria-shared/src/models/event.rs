/// Calendar event model and database operations
///
/// Same ownership rule as tasks: every query is filtered by `owner_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     event_date TIMESTAMPTZ NOT NULL,
///     location VARCHAR(255),
///     is_all_day BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::patch::FieldUpdates;

const EVENT_COLUMNS: &str =
    "id, owner_id, title, description, event_date, location, is_all_day, created_at, updated_at";

/// Owner-scoped calendar event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub is_all_day: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub is_all_day: bool,
}

/// Partial update of an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub event_date: Option<DateTime<Utc>>,
    pub location: Option<Option<String>>,
    pub is_all_day: Option<bool>,
}

impl Event {
    pub async fn create(pool: &PgPool, owner_id: Uuid, data: CreateEvent) -> Result<Self, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (owner_id, title, description, event_date, location, is_all_day)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, title, description, event_date, location,
                      is_all_day, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.event_date)
        .bind(data.location)
        .bind(data.is_all_day)
        .fetch_one(pool)
        .await?;

        Ok(event)
    }

    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, owner_id, title, description, event_date, location,
                   is_all_day, created_at, updated_at
            FROM events
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// Lists the owner's events in chronological order
    pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, owner_id, title, description, event_date, location,
                   is_all_day, created_at, updated_at
            FROM events
            WHERE owner_id = $1
            ORDER BY event_date ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    pub async fn update_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut updates = FieldUpdates::new("events");
        updates
            .set_if("title", data.title)
            .set_if("description", data.description)
            .set_if("event_date", data.event_date)
            .set_if("location", data.location)
            .set_if("is_all_day", data.is_all_day);

        if updates.is_empty() {
            return Self::find_for_owner(pool, owner_id, id).await;
        }

        let mut query = updates.into_query();
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND owner_id = ")
            .push_bind(owner_id)
            .push(" RETURNING ")
            .push(EVENT_COLUMNS);

        let event = query.build_query_as::<Event>().fetch_optional(pool).await?;

        Ok(event)
    }

    pub async fn delete_for_owner(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
