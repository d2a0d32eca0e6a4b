/// Typed outcome of service operations
///
/// Every service function returns `ServiceResult<T>`. The HTTP crates translate
/// each variant to a status code at the transport boundary, so no service code
/// needs to know about HTTP.

use crate::auth::{jwt::JwtError, password::PasswordError};

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Service-level error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed input
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Input collides with an existing record (duplicate email or username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing record, or a record the caller does not own
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage, notification or other infrastructure failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Validation error with a single message and no field details
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Validation error attached to one field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ServiceError::Validation {
            message: message.clone(),
            fields: vec![FieldError {
                field: field.to_string(),
                message,
            }],
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ServiceError::Validation {
            message: "Request validation failed".to_string(),
            fields,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("email") {
                        return ServiceError::Conflict("Email is already registered".to_string());
                    }
                    if constraint.contains("username") {
                        return ServiceError::Conflict("Username is already taken".to_string());
                    }
                    return ServiceError::Conflict(format!("Constraint violation: {}", constraint));
                }

                // string_data_right_truncation: a value wider than its column
                if db_err.code().as_deref() == Some("22001") {
                    return ServiceError::validation("A value exceeds the allowed length");
                }

                ServiceError::Internal(format!("Database error: {}", db_err))
            }
            _ => ServiceError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ServiceError::Internal(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}
