/// Owner-scoped task operations
///
/// Every function takes the caller's user ID. A task owned by someone else
/// yields the same `NotFound` as a missing one.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::clean_optional;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, Task, TaskPriority, UpdateTask};

const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

/// Partial task update; nullable fields accept an explicit `null`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub priority: Option<TaskPriority>,
    pub is_completed: Option<bool>,
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(TASK_NOT_FOUND.to_string())
}

pub async fn list(pool: &PgPool, owner_id: Uuid) -> ServiceResult<Vec<Task>> {
    Ok(Task::list_for_owner(pool, owner_id).await?)
}

pub async fn get(pool: &PgPool, owner_id: Uuid, id: Uuid) -> ServiceResult<Task> {
    Task::find_for_owner(pool, owner_id, id)
        .await?
        .ok_or_else(not_found)
}

pub async fn create(pool: &PgPool, owner_id: Uuid, request: CreateTaskRequest) -> ServiceResult<Task> {
    request.validate()?;

    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ServiceError::field("title", "Title must not be blank"));
    }

    let task = Task::create(
        pool,
        owner_id,
        CreateTask {
            title,
            description: clean_optional(request.description),
            due_date: request.due_date,
            priority: request.priority.unwrap_or_default(),
        },
    )
    .await?;

    info!(task_id = %task.id, owner_id = %owner_id, "Task created");
    Ok(task)
}

pub async fn update(
    pool: &PgPool,
    owner_id: Uuid,
    id: Uuid,
    request: UpdateTaskRequest,
) -> ServiceResult<Task> {
    request.validate()?;

    let title = request.title.map(|t| t.trim().to_string());
    if title.as_deref() == Some("") {
        return Err(ServiceError::field("title", "Title must not be blank"));
    }

    let task = Task::update_for_owner(
        pool,
        owner_id,
        id,
        UpdateTask {
            title,
            description: request.description.map(clean_optional),
            due_date: request.due_date,
            priority: request.priority,
            is_completed: request.is_completed,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    info!(task_id = %task.id, "Task updated");
    Ok(task)
}

pub async fn toggle(pool: &PgPool, owner_id: Uuid, id: Uuid) -> ServiceResult<Task> {
    let task = Task::toggle_completion(pool, owner_id, id)
        .await?
        .ok_or_else(not_found)?;

    info!(task_id = %task.id, is_completed = task.is_completed, "Task toggled");
    Ok(task)
}

pub async fn delete(pool: &PgPool, owner_id: Uuid, id: Uuid) -> ServiceResult<()> {
    if !Task::delete_for_owner(pool, owner_id, id).await? {
        return Err(not_found());
    }

    info!(task_id = %id, "Task deleted");
    Ok(())
}
