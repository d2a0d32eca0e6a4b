/// Database models for Secretaria AngLon
///
/// Each model owns its SQL. Operations return `sqlx::Error`; the service layer
/// turns those into [`ServiceError`](crate::error::ServiceError).
///
/// # Models
///
/// - `user`: Accounts and credentials
/// - `task`: Owner-scoped to-do items
/// - `event`: Owner-scoped calendar events
/// - `password_reset`: Single-use reset codes keyed by email
/// - `system_log`: Admin audit trail
/// - `patch`: Partial-update builder shared by the update operations
///
/// # Example
///
/// ```no_run
/// use secretaria_shared::models::user::{User, CreateUser};
/// use secretaria_shared::db::pool::create_pool;
/// use secretaria_shared::config::DatabaseConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(&DatabaseConfig::from_env()?).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     username: "user".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: Some("John Doe".to_string()),
///     phone_number: None,
///     is_active: true,
///     is_admin: false,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod event;
pub mod password_reset;
pub mod patch;
pub mod system_log;
pub mod task;
pub mod user;
