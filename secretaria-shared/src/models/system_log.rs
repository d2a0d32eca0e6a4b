/// Append-only audit trail written by the admin service
///
/// # Schema
///
/// ```sql
/// CREATE TYPE log_level AS ENUM ('info', 'warning', 'error');
///
/// CREATE TABLE system_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     level log_level NOT NULL,
///     message TEXT NOT NULL,
///     action VARCHAR(64) NOT NULL,
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "log_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemLog {
    pub id: Uuid,
    pub level: LogLevel,
    pub message: String,

    /// Machine-readable action name, e.g. `user_created`
    pub action: String,

    /// User the action concerned, if any
    pub user_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSystemLog {
    pub level: LogLevel,
    pub message: String,
    pub action: String,
    pub user_id: Option<Uuid>,
}

impl SystemLog {
    pub async fn append(pool: &PgPool, data: CreateSystemLog) -> Result<Self, sqlx::Error> {
        let log = sqlx::query_as::<_, SystemLog>(
            r#"
            INSERT INTO system_logs (level, message, action, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, level, message, action, user_id, created_at
            "#,
        )
        .bind(data.level)
        .bind(data.message)
        .bind(data.action)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(log)
    }

    /// Lists entries, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let logs = sqlx::query_as::<_, SystemLog>(
            r#"
            SELECT id, level, message, action, user_id, created_at
            FROM system_logs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(logs)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM system_logs")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
