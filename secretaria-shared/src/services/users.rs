/// Admin user management
///
/// Global CRUD over accounts plus the admin login. Every mutation appends a
/// row to the audit log through [`audit::record`].
///
/// # Username derivation
///
/// When an admin creates a user without a username, one is derived from the
/// email local part, keeping only `[A-Za-z0-9._-]`, lowercased. On collision a
/// numeric suffix is appended: `alice`, `alice1`, `alice2`, ...
/// A local part shorter than the username minimum gets a `_user` suffix
/// (`al@x.com` becomes `al_user`).

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{
    audit, check_profile_text, clean_optional, is_username_char, validate_username, MessageResponse,
    Pagination, MIN_USERNAME_CHARS,
};
use crate::auth::jwt::{TokenIssuer, TokenScope};
use crate::auth::password::{validate_password_strength, PasswordHasher};
use crate::error::{ServiceError, ServiceResult};
use crate::models::system_log::LogLevel;
use crate::models::user::{CreateUser, UpdateUser, User};

const USER_NOT_FOUND: &str = "User not found";

/// Error for every failed admin login, whatever the cause
pub const BAD_ADMIN_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Derived from the email when absent or blank
    pub username: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 255, message = "Full name must be at most 255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 50, message = "Phone number must be at most 50 characters"))]
    pub phone_number: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    pub username: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub full_name: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone_number: Option<Option<String>>,

    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity block returned with the admin token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AdminIdentity,
}

/// Base username from an email's local part
pub fn derive_username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter(|c| is_username_char(*c))
        .take(45)
        .collect::<String>()
        .to_lowercase();

    match base.chars().count() {
        0 => "user".to_string(),
        n if n < MIN_USERNAME_CHARS => format!("{}_user", base),
        _ => base,
    }
}

/// First of `base`, `base1`, `base2`, ... not present in `taken`
pub fn next_available_username(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == base) {
        return base.to_string();
    }

    (1u64..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.iter().any(|t| t == candidate))
        .unwrap_or_else(|| base.to_string())
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(USER_NOT_FOUND.to_string())
}

pub async fn list(pool: &PgPool, page: Pagination) -> ServiceResult<Vec<User>> {
    let (limit, offset) = page.resolve();
    Ok(User::list(pool, limit, offset).await?)
}

pub async fn get(pool: &PgPool, id: Uuid) -> ServiceResult<User> {
    User::find_by_id(pool, id).await?.ok_or_else(not_found)
}

/// Creates a user on behalf of an admin
pub async fn create(
    pool: &PgPool,
    hasher: &PasswordHasher,
    actor: Uuid,
    request: AdminCreateUserRequest,
) -> ServiceResult<User> {
    request.validate()?;
    validate_password_strength(&request.password).map_err(|m| ServiceError::field("password", m))?;

    if User::email_taken(pool, &request.email, None).await? {
        return Err(ServiceError::Conflict("Email is already registered".to_string()));
    }

    let username = match clean_optional(request.username) {
        Some(username) => {
            validate_username(&username)?;
            if User::username_taken(pool, &username, None).await? {
                return Err(ServiceError::Conflict("Username is already taken".to_string()));
            }
            username
        }
        None => {
            let base = derive_username_base(&request.email);
            let taken = User::usernames_with_prefix(pool, &base).await?;
            next_available_username(&base, &taken)
        }
    };

    let password_hash = hasher.hash(&request.password)?;

    let user = User::create(
        pool,
        CreateUser {
            email: request.email,
            username,
            password_hash,
            full_name: clean_optional(request.full_name),
            phone_number: clean_optional(request.phone_number),
            is_active: request.is_active,
            is_admin: request.is_admin,
        },
    )
    .await?;

    info!(user_id = %user.id, admin_id = %actor, "User created by admin");
    audit::record(
        pool,
        LogLevel::Info,
        "user_created",
        format!("User {} created", user.username),
        Some(user.id),
    )
    .await;

    Ok(user)
}

/// Applies a partial update to any user
pub async fn update(
    pool: &PgPool,
    actor: Uuid,
    id: Uuid,
    request: AdminUpdateUserRequest,
) -> ServiceResult<User> {
    request.validate()?;

    let username = request.username.map(|u| u.trim().to_string());
    if let Some(username) = &username {
        validate_username(username)?;
        if User::username_taken(pool, username, Some(id)).await? {
            return Err(ServiceError::Conflict("Username is already taken".to_string()));
        }
    }

    if let Some(email) = &request.email {
        if User::email_taken(pool, email, Some(id)).await? {
            return Err(ServiceError::Conflict("Email is already registered".to_string()));
        }
    }

    let full_name = request.full_name.map(clean_optional);
    let phone_number = request.phone_number.map(clean_optional);
    check_profile_text(&full_name, &phone_number)?;

    let update = UpdateUser {
        email: request.email,
        username,
        full_name,
        phone_number,
        is_active: request.is_active,
        is_admin: request.is_admin,
    };

    let user = User::update(pool, id, update).await?.ok_or_else(not_found)?;

    info!(user_id = %user.id, admin_id = %actor, "User updated by admin");
    audit::record(
        pool,
        LogLevel::Info,
        "user_updated",
        format!("User {} updated", user.username),
        Some(user.id),
    )
    .await;

    Ok(user)
}

/// Deletes a user and, by cascade, their tasks and events
pub async fn delete(pool: &PgPool, actor: Uuid, id: Uuid) -> ServiceResult<MessageResponse> {
    let user = User::find_by_id(pool, id).await?.ok_or_else(not_found)?;

    if !User::delete(pool, id).await? {
        return Err(not_found());
    }

    info!(user_id = %id, admin_id = %actor, "User deleted by admin");
    audit::record(
        pool,
        LogLevel::Warning,
        "user_deleted",
        format!("User {} deleted", user.username),
        None,
    )
    .await;

    Ok(MessageResponse::new("User deleted successfully"))
}

/// Sets a new password for any user
pub async fn change_password(
    pool: &PgPool,
    hasher: &PasswordHasher,
    actor: Uuid,
    id: Uuid,
    request: ChangePasswordRequest,
) -> ServiceResult<MessageResponse> {
    request.validate()?;
    validate_password_strength(&request.new_password)
        .map_err(|m| ServiceError::field("new_password", m))?;

    let password_hash = hasher.hash(&request.new_password)?;

    if !User::set_password(pool, id, &password_hash).await? {
        return Err(not_found());
    }

    info!(user_id = %id, admin_id = %actor, "Password changed by admin");
    audit::record(
        pool,
        LogLevel::Info,
        "password_changed",
        "Password changed by administrator",
        Some(id),
    )
    .await;

    Ok(MessageResponse::new("Password changed successfully"))
}

/// Authenticates an administrator by username and issues an admin-scoped token
///
/// Unknown username, wrong password and non-admin accounts all yield the same
/// `Unauthorized`; an inactive admin gets `Forbidden`.
pub async fn login(
    pool: &PgPool,
    hasher: &PasswordHasher,
    tokens: &TokenIssuer,
    request: AdminLoginRequest,
) -> ServiceResult<AdminLoginResponse> {
    let rejected = || ServiceError::Unauthorized(BAD_ADMIN_CREDENTIALS_MESSAGE.to_string());

    let user = User::find_by_username(pool, &request.username)
        .await?
        .ok_or_else(rejected)?;

    if !hasher.verify(&request.password, &user.password_hash)? || !user.is_admin {
        return Err(rejected());
    }

    if !user.is_active {
        return Err(ServiceError::Forbidden("Inactive user".to_string()));
    }

    let access_token = tokens.issue(user.id, TokenScope::Admin, None)?;

    info!(user_id = %user.id, "Admin logged in");
    audit::record(
        pool,
        LogLevel::Info,
        "admin_login",
        format!("Administrator {} logged in", user.username),
        Some(user.id),
    )
    .await;

    Ok(AdminLoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: tokens.default_ttl().num_seconds(),
        user: AdminIdentity {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        },
    })
}
