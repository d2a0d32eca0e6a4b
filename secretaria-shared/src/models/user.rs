/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     username VARCHAR(100) NOT NULL UNIQUE,
///     full_name VARCHAR(255),
///     phone_number VARCHAR(50),
///     photo_url VARCHAR(512),
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are stored lowercase; callers normalize with [`normalize_email`]
/// before writing or looking up.
///
/// # Example
///
/// ```no_run
/// use secretaria_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "alice@x.com".to_string(),
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: Some("Alice".to_string()),
///     phone_number: None,
///     is_active: true,
///     is_admin: false,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "alice@x.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::patch::FieldUpdates;

const USER_COLUMNS: &str = "id, email, username, full_name, phone_number, photo_url, \
                            password_hash, is_active, is_admin, created_at, updated_at";

/// User account
///
/// The password hash is never serialized into responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique, stored lowercase
    pub email: String,

    /// Login name, unique
    pub username: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Optional phone number
    pub phone_number: Option<String>,

    /// Retrieval path of the profile photo, if any
    pub photo_url: Option<String>,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Inactive users cannot authenticate
    pub is_active: bool,

    /// Grants access to the admin API
    pub is_admin: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
}

/// Partial update of a user
///
/// Only `Some` fields are written. Nullable columns use `Some(None)` to clear.
/// The password is deliberately absent: it changes only through
/// [`User::set_password`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`users_email_key` / `users_username_key`)
    /// when the email or username is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, full_name, phone_number, is_active, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, username, full_name, phone_number, photo_url,
                      password_hash, is_active, is_admin, created_at, updated_at
            "#,
        )
        .bind(normalize_email(&data.email))
        .bind(data.username.trim())
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.phone_number)
        .bind(data.is_active)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, phone_number, photo_url,
                   password_hash, is_active, is_admin, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, phone_number, photo_url,
                   password_hash, is_active, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by username
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, phone_number, photo_url,
                   password_hash, is_active, is_admin, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.trim())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Returns true when `email` belongs to a user other than `except`
    pub async fn email_taken(
        pool: &PgPool,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(normalize_email(email))
        .bind(except)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Returns true when `username` belongs to a user other than `except`
    pub async fn username_taken(
        pool: &PgPool,
        username: &str,
        except: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username.trim())
        .bind(except)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Applies a partial update
    ///
    /// Returns `None` when the user does not exist. An empty update returns
    /// the current row untouched.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut updates = FieldUpdates::new("users");
        updates
            .set_if("email", data.email.as_deref().map(normalize_email))
            .set_if("username", data.username.map(|u| u.trim().to_string()))
            .set_if("full_name", data.full_name)
            .set_if("phone_number", data.phone_number)
            .set_if("is_active", data.is_active)
            .set_if("is_admin", data.is_admin);

        if updates.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut query = updates.into_query();
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        let user = query.build_query_as::<User>().fetch_optional(pool).await?;

        Ok(user)
    }

    /// Replaces the password hash
    ///
    /// Returns true if the user was found.
    pub async fn set_password<'e, E>(executor: E, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets or clears the profile photo reference
    pub async fn set_photo_url(
        pool: &PgPool,
        id: Uuid,
        photo_url: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET photo_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, username, full_name, phone_number, photo_url,
                      password_hash, is_active, is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(photo_url)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Tasks and events cascade. Returns true if the user existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, full_name, phone_number, photo_url,
                   password_hash, is_active, is_admin, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Usernames equal to `base` or starting with it
    ///
    /// Used to pick a free username suffix without probing one by one.
    pub async fn usernames_with_prefix(pool: &PgPool, base: &str) -> Result<Vec<String>, sqlx::Error> {
        let pattern = format!("{}%", escape_like(base));
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT username FROM users WHERE username LIKE $1 ESCAPE '\\'",
        )
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(names)
    }

    /// Counts users: (total, active, admins)
    pub async fn counts(pool: &PgPool) -> Result<(i64, i64, i64), sqlx::Error> {
        let counts: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_active),
                   COUNT(*) FILTER (WHERE is_admin)
            FROM users
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
