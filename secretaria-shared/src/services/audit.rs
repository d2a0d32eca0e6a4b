/// System statistics and the admin audit log
///
/// Audit writes are best effort: a failed insert is logged through `tracing`
/// and never fails the operation being audited.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::Pagination;
use crate::error::ServiceResult;
use crate::models::event::Event;
use crate::models::system_log::{CreateSystemLog, LogLevel, SystemLog};
use crate::models::task::Task;
use crate::models::user::User;

/// Live counters shown on the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_users: i64,
    pub active_users: i64,
    pub admin_users: i64,
    pub total_tasks: i64,
    pub total_events: i64,

    /// Human-readable uptime, e.g. `2d 3h 4m 5s`
    pub system_uptime: String,

    pub uptime_seconds: u64,
}

/// Collects live counts from the database
pub async fn stats(pool: &PgPool, started_at: Instant) -> ServiceResult<SystemStats> {
    let (total_users, active_users, admin_users) = User::counts(pool).await?;
    let total_tasks = Task::count(pool).await?;
    let total_events = Event::count(pool).await?;

    let uptime_seconds = started_at.elapsed().as_secs();

    Ok(SystemStats {
        total_users,
        active_users,
        admin_users,
        total_tasks,
        total_events,
        system_uptime: format_uptime(uptime_seconds),
        uptime_seconds,
    })
}

/// Lists audit entries, newest first
pub async fn logs(pool: &PgPool, page: Pagination) -> ServiceResult<Vec<SystemLog>> {
    let (limit, offset) = page.resolve();
    Ok(SystemLog::list(pool, limit, offset).await?)
}

/// Appends an audit entry, swallowing failures
pub async fn record(
    pool: &PgPool,
    level: LogLevel,
    action: &str,
    message: impl Into<String>,
    user_id: Option<Uuid>,
) {
    let entry = CreateSystemLog {
        level,
        message: message.into(),
        action: action.to_string(),
        user_id,
    };

    if let Err(e) = SystemLog::append(pool, entry).await {
        warn!(action, error = %e, "Failed to write audit log entry");
    }
}

pub fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
