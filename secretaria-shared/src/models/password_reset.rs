/// Password reset codes
///
/// Short-lived, single-use 6-digit codes keyed by email address. Rows are not
/// tied to a user row: a code can be issued for an email that later turns out
/// not to exist, which keeps the forgot-password response uniform.
///
/// # Lifecycle
///
/// ```text
/// (none) → issued → used        (successful reset)
///                 → superseded  (a newer code was issued, stored as used)
///                 → expired     (expires_at passed)
/// ```
///
/// The operations take any [`PgExecutor`] so the callers can run issue and
/// consume steps inside a single transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE password_reset_codes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,
///     code VARCHAR(6) NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL,
///     used BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

/// Minutes a freshly issued code stays valid
pub const RESET_CODE_TTL_MINUTES: i64 = 15;

/// Number of digits in a code
pub const RESET_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PasswordResetCode {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Generates a uniformly random 6-digit code, leading zeros allowed
pub fn generate_code() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", value)
}

impl PasswordResetCode {
    /// Serializes code issuance for `email` until the transaction ends
    ///
    /// Without it two concurrent requests could each supersede the other's
    /// rows before either insert commits, leaving two usable codes.
    pub async fn lock_email<'e, E>(executor: E, email: &str) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(email)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Marks every unused code for `email` as used
    ///
    /// Returns the number of superseded codes.
    pub async fn invalidate_unused<'e, E>(executor: E, email: &str) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE password_reset_codes SET used = TRUE WHERE email = $1 AND used = FALSE",
        )
        .bind(email)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Stores a new code expiring [`RESET_CODE_TTL_MINUTES`] from now
    pub async fn create<'e, E>(executor: E, email: &str, code: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);

        let row = sqlx::query_as::<_, PasswordResetCode>(
            r#"
            INSERT INTO password_reset_codes (email, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, code, expires_at, used, created_at
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    /// Locks the matching unused, unexpired code
    ///
    /// Must run inside a transaction; the row lock serializes concurrent
    /// resets that present the same code.
    pub async fn find_valid_for_update<'e, E>(
        executor: E,
        email: &str,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, PasswordResetCode>(
            r#"
            SELECT id, email, code, expires_at, used, created_at
            FROM password_reset_codes
            WHERE email = $1 AND code = $2 AND used = FALSE AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// Marks a code as consumed
    pub async fn mark_used<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE password_reset_codes SET used = TRUE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
