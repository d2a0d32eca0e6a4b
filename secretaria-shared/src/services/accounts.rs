/// Account operations for the user API
///
/// Registration, login, the caller's own profile and password recovery.
///
/// # Password recovery
///
/// ```text
/// forgot-password(email)
///   ├─ unknown email → nothing stored, nothing sent
///   └─ known email   → [tx: supersede unused codes, insert new code] → send
///   → identical response in both cases
///
/// reset-password(email, code, new_password)
///   └─ [tx: lock matching unused unexpired code, set password, mark used]
/// ```
///
/// Both transactions commit or roll back as a unit, so a caller never sees
/// the password changed while the code is still usable or the reverse.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{check_profile_text, clean_optional, validate_username, MessageResponse};
use crate::auth::jwt::{TokenIssuer, TokenScope};
use crate::auth::password::{validate_password_strength, PasswordHasher};
use crate::error::{ServiceError, ServiceResult};
use crate::mail::Notifier;
use crate::models::password_reset::{generate_code, PasswordResetCode, RESET_CODE_LENGTH};
use crate::models::user::{normalize_email, CreateUser, UpdateUser, User};

/// Response to every forgot-password request
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If the email is registered, a recovery code has been sent";

/// Response to a successful reset
pub const RESET_PASSWORD_MESSAGE: &str = "Password has been reset successfully";

/// Error for any reset-code lookup miss
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired code";

/// Error for every failed login, whatever the cause
pub const BAD_CREDENTIALS_MESSAGE: &str = "Incorrect email or password";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 255, message = "Full name must be at most 255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 50, message = "Phone number must be at most 50 characters"))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token handed out by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,

    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Partial profile update
///
/// `full_name` and `phone_number` distinguish an absent field from an
/// explicit `null`, which clears the value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
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
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(equal = 6, message = "Code must have 6 digits"))]
    pub code: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Creates an account
pub async fn register(
    pool: &PgPool,
    hasher: &PasswordHasher,
    request: RegisterRequest,
) -> ServiceResult<User> {
    request.validate()?;
    let username = request.username.trim().to_string();
    validate_username(&username)?;
    validate_password_strength(&request.password).map_err(|m| ServiceError::field("password", m))?;

    if User::email_taken(pool, &request.email, None).await? {
        return Err(ServiceError::Conflict("Email is already registered".to_string()));
    }
    if User::username_taken(pool, &username, None).await? {
        return Err(ServiceError::Conflict("Username is already taken".to_string()));
    }

    let password_hash = hasher.hash(&request.password)?;

    // The unique constraints still catch a concurrent registration.
    let user = User::create(
        pool,
        CreateUser {
            email: request.email,
            username,
            password_hash,
            full_name: clean_optional(request.full_name),
            phone_number: clean_optional(request.phone_number),
            is_active: true,
            is_admin: false,
        },
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Checks credentials by email
///
/// Unknown email and wrong password produce the same error.
pub async fn authenticate(
    pool: &PgPool,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> ServiceResult<User> {
    let Some(user) = User::find_by_email(pool, email).await? else {
        debug!("Login attempt for unknown email");
        return Err(ServiceError::Unauthorized(BAD_CREDENTIALS_MESSAGE.to_string()));
    };

    if !hasher.verify(password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ServiceError::Unauthorized(BAD_CREDENTIALS_MESSAGE.to_string()));
    }

    if !user.is_active {
        return Err(ServiceError::Forbidden("Inactive user".to_string()));
    }

    Ok(user)
}

/// Authenticates and issues an app-scoped token
pub async fn login(
    pool: &PgPool,
    hasher: &PasswordHasher,
    tokens: &TokenIssuer,
    request: LoginRequest,
) -> ServiceResult<TokenResponse> {
    let user = authenticate(pool, hasher, &request.email, &request.password).await?;

    let access_token = tokens.issue(user.id, TokenScope::App, None)?;

    info!(user_id = %user.id, "User logged in");
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: tokens.default_ttl().num_seconds(),
    })
}

/// Applies a partial update to the caller's own profile
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    request: UpdateProfileRequest,
) -> ServiceResult<User> {
    request.validate()?;

    let username = request.username.map(|u| u.trim().to_string());
    if let Some(username) = &username {
        validate_username(username)?;
        if User::username_taken(pool, username, Some(user_id)).await? {
            return Err(ServiceError::Conflict("Username is already taken".to_string()));
        }
    }

    if let Some(email) = &request.email {
        if User::email_taken(pool, email, Some(user_id)).await? {
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
        ..Default::default()
    };

    let user = User::update(pool, user_id, update)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");
    Ok(user)
}

/// Supersedes unused codes for `email` and stores a fresh one
///
/// Returns the new code. Both steps share one transaction, serialized per
/// email by an advisory lock.
pub async fn issue_reset_code(pool: &PgPool, email: &str) -> ServiceResult<String> {
    let email = normalize_email(email);
    let code = generate_code();

    let mut tx = pool.begin().await?;
    PasswordResetCode::lock_email(&mut *tx, &email).await?;
    let superseded = PasswordResetCode::invalidate_unused(&mut *tx, &email).await?;
    PasswordResetCode::create(&mut *tx, &email, &code).await?;
    tx.commit().await?;

    debug!(superseded, "Reset code issued");
    Ok(code)
}

/// Starts password recovery
///
/// The response never reveals whether the email is registered.
pub async fn forgot_password(
    pool: &PgPool,
    notifier: &dyn Notifier,
    request: ForgotPasswordRequest,
) -> ServiceResult<MessageResponse> {
    request.validate()?;
    let email = normalize_email(&request.email);

    if User::find_by_email(pool, &email).await?.is_some() {
        let code = issue_reset_code(pool, &email).await?;

        notifier.send_reset_code(&email, &code).await.map_err(|e| {
            error!(error = %e, "Failed to send reset code");
            ServiceError::Internal(format!("Failed to send recovery email: {}", e))
        })?;
    } else {
        debug!("Password recovery requested for unknown email");
    }

    Ok(MessageResponse::new(FORGOT_PASSWORD_MESSAGE))
}

/// Consumes a reset code and sets the new password
pub async fn reset_password(
    pool: &PgPool,
    hasher: &PasswordHasher,
    request: ResetPasswordRequest,
) -> ServiceResult<MessageResponse> {
    request.validate()?;
    validate_password_strength(&request.new_password)
        .map_err(|m| ServiceError::field("new_password", m))?;

    if request.code.len() != RESET_CODE_LENGTH || !request.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::field("code", INVALID_CODE_MESSAGE));
    }

    let email = normalize_email(&request.email);
    let password_hash = hasher.hash(&request.new_password)?;

    let mut tx = pool.begin().await?;

    let Some(reset) = PasswordResetCode::find_valid_for_update(&mut *tx, &email, &request.code).await?
    else {
        return Err(ServiceError::field("code", INVALID_CODE_MESSAGE));
    };

    let Some(user) = User::find_by_email(&mut *tx, &email).await? else {
        warn!("Valid reset code for an email without account");
        return Err(ServiceError::field("code", INVALID_CODE_MESSAGE));
    };

    User::set_password(&mut *tx, user.id, &password_hash).await?;
    PasswordResetCode::mark_used(&mut *tx, reset.id).await?;

    tx.commit().await?;

    info!(user_id = %user.id, "Password reset with recovery code");
    Ok(MessageResponse::new(RESET_PASSWORD_MESSAGE))
}
