/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`jwt`]: Bearer token issuance and verification
/// - [`middleware`]: Per-request authorization gate for Axum routers
///
/// # Example
///
/// ```no_run
/// use secretaria_shared::auth::jwt::{TokenIssuer, TokenScope};
/// use secretaria_shared::auth::password::PasswordHasher;
/// use secretaria_shared::config::PasswordConfig;
/// use jsonwebtoken::Algorithm;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(PasswordConfig::default())?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash)?);
///
/// let issuer = TokenIssuer::new("a-secret-that-is-at-least-32-bytes!", Algorithm::HS256);
/// let token = issuer.issue(Uuid::new_v4(), TokenScope::App, None)?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
