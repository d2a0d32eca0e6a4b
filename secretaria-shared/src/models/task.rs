/// Task model and database operations
///
/// Tasks are personal to-do items. Every row belongs to exactly one user and
/// every query in this module is filtered by `owner_id`, so a task owned by
/// someone else behaves exactly like a task that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use secretaria_shared::models::task::{Task, CreateTask, TaskPriority};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, owner_id, CreateTask {
///     title: "Buy milk".to_string(),
///     description: None,
///     due_date: None,
///     priority: TaskPriority::default(),
/// }).await?;
///
/// let toggled = Task::toggle_completion(&pool, owner_id, task.id).await?;
/// assert_eq!(toggled.map(|t| t.is_completed), Some(true));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::patch::FieldUpdates;

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, due_date, priority, is_completed, created_at, updated_at";

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Owner-scoped to-do item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// User who owns the task
    pub owner_id: Uuid,

    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
}

/// Partial update of a task
///
/// `Some(None)` clears a nullable column; `None` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<TaskPriority>,
    pub is_completed: Option<bool>,
}

impl Task {
    /// Creates a task owned by `owner_id`
    pub async fn create(pool: &PgPool, owner_id: Uuid, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_id, title, description, due_date, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, title, description, due_date, priority,
                      is_completed, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID within the owner's tasks
    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, due_date, priority,
                   is_completed, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists the owner's tasks, newest first
    pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, due_date, priority,
                   is_completed, created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update to one of the owner's tasks
    pub async fn update_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut updates = FieldUpdates::new("tasks");
        updates
            .set_if("title", data.title)
            .set_if("description", data.description)
            .set_if("due_date", data.due_date)
            .set_if("priority", data.priority)
            .set_if("is_completed", data.is_completed);

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
            .push(TASK_COLUMNS);

        let task = query.build_query_as::<Task>().fetch_optional(pool).await?;

        Ok(task)
    }

    /// Flips `is_completed` in a single statement
    pub async fn toggle_completion(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET is_completed = NOT is_completed, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, due_date, priority,
                      is_completed, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes one of the owner's tasks
    ///
    /// Returns true if a row was deleted.
    pub async fn delete_for_owner(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all tasks
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
