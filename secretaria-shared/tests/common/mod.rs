/// Shared helpers for database-backed tests
///
/// Tests need a PostgreSQL database in `DATABASE_URL`. When it is not set the
/// helpers return `None` and each test returns early.

use secretaria_shared::auth::password::PasswordHasher;
use secretaria_shared::config::{DatabaseConfig, PasswordConfig};
use secretaria_shared::db::migrations::{ensure_database_exists, run_migrations};
use secretaria_shared::db::pool::create_pool;
use secretaria_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use uuid::Uuid;

pub fn database_url() -> Option<String> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping database test");
            None
        }
    }
}

/// Migrated pool, or `None` without a database
pub async fn pool() -> Option<PgPool> {
    let url = database_url()?;
    ensure_database_exists(&url).await.expect("Failed to create database");

    let pool = create_pool(&DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("Failed to create pool");

    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}

/// Cheap hasher so tests stay fast
pub fn hasher() -> PasswordHasher {
    PasswordHasher::new(PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid params")
}

/// Unique tag so parallel tests never collide on email or username
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
}

/// Inserts an active user with password `password123`
pub async fn create_user(pool: &PgPool, is_admin: bool) -> User {
    let name = unique("user");
    User::create(
        pool,
        CreateUser {
            email: format!("{}@example.com", name),
            username: name,
            password_hash: hasher().hash("password123").expect("hash"),
            full_name: None,
            phone_number: None,
            is_active: true,
            is_admin,
        },
    )
    .await
    .expect("Failed to create user")
}
