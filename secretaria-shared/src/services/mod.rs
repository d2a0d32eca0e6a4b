/// Service layer shared by the user API and the admin API
///
/// Handlers stay thin: they extract the request, call one function from here
/// and turn the [`ServiceResult`](crate::error::ServiceResult) into a
/// response. Everything that touches more than one model, hashes a password,
/// signs a token or sends mail lives in this layer.
///
/// # Modules
///
/// - `accounts`: Registration, login, profile, password recovery
/// - `tasks` / `events`: Owner-scoped CRUD
/// - `users`: Admin user management and admin login
/// - `upload`: Profile photo validation, storage and normalization
/// - `audit`: System statistics and the admin audit log

use serde::{Deserialize, Serialize};

pub mod accounts;
pub mod audit;
pub mod events;
pub mod tasks;
pub mod upload;
pub mod users;

/// `{"message": ...}` body returned by operations without a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Default page size for admin listings
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Largest page size a caller may request
pub const MAX_PAGE_LIMIT: i64 = 500;

/// `?skip=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Returns `(limit, offset)` with defaults applied and bounds clamped
    pub fn resolve(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = self.skip.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Characters accepted in a username
pub(crate) fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Username policy applied to client-supplied usernames
pub(crate) fn validate_username(username: &str) -> Result<(), crate::error::ServiceError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_CHARS..=50).contains(&len) {
        return Err(crate::error::ServiceError::field(
            "username",
            "Username must be between 3 and 50 characters",
        ));
    }

    if !username.chars().all(is_username_char) {
        return Err(crate::error::ServiceError::field(
            "username",
            "Username may only contain letters, digits, '.', '_' and '-'",
        ));
    }

    Ok(())
}

/// Column widths for bounded text fields
pub const MAX_EMAIL_CHARS: usize = 255;
pub const MAX_FULL_NAME_CHARS: usize = 255;
pub const MAX_PHONE_CHARS: usize = 50;
pub const MAX_LOCATION_CHARS: usize = 255;

/// Shortest username accepted anywhere
pub(crate) const MIN_USERNAME_CHARS: usize = 3;

/// Rejects a value wider than its column
///
/// Used for the clearable `Option<Option<_>>` fields, which the derive
/// attributes do not reach.
pub(crate) fn check_max_chars(
    field: &str,
    label: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), crate::error::ServiceError> {
    match value {
        Some(value) if value.chars().count() > max => Err(crate::error::ServiceError::field(
            field,
            format!("{} must be at most {} characters", label, max),
        )),
        _ => Ok(()),
    }
}

/// Width checks for the clearable profile fields of a partial update
pub(crate) fn check_profile_text(
    full_name: &Option<Option<String>>,
    phone_number: &Option<Option<String>>,
) -> Result<(), crate::error::ServiceError> {
    check_max_chars(
        "full_name",
        "Full name",
        full_name.as_ref().and_then(Option::as_deref),
        MAX_FULL_NAME_CHARS,
    )?;
    check_max_chars(
        "phone_number",
        "Phone number",
        phone_number.as_ref().and_then(Option::as_deref),
        MAX_PHONE_CHARS,
    )
}

/// Trims optional text; blank becomes `None`
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("john.doe-2_x").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_pagination_resolve() {
        assert_eq!(Pagination::default().resolve(), (100, 0));
        assert_eq!(
            Pagination { skip: Some(20), limit: Some(10) }.resolve(),
            (10, 20)
        );
        assert_eq!(
            Pagination { skip: Some(-5), limit: Some(10_000) }.resolve(),
            (MAX_PAGE_LIMIT, 0)
        );
        assert_eq!(Pagination { skip: None, limit: Some(0) }.resolve(), (1, 0));
    }

    #[test]
    fn test_check_max_chars() {
        assert!(check_max_chars("phone_number", "Phone number", None, MAX_PHONE_CHARS).is_ok());
        assert!(check_max_chars("phone_number", "Phone number", Some("+34 600"), MAX_PHONE_CHARS).is_ok());
        assert!(check_max_chars("location", "Location", Some(&"ñ".repeat(255)), MAX_LOCATION_CHARS).is_ok());

        let err = check_max_chars("phone_number", "Phone number", Some(&"9".repeat(80)), MAX_PHONE_CHARS)
            .unwrap_err();
        match err {
            crate::error::ServiceError::Validation { fields, .. } => {
                assert_eq!(fields[0].field, "phone_number");
                assert_eq!(fields[0].message, "Phone number must be at most 50 characters");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  Alice ".into())), Some("Alice".into()));
        assert_eq!(clean_optional(Some("   ".into())), None);
        assert_eq!(clean_optional(None), None);
    }
}
