/// Configuration sections shared by the user API and the admin API
///
/// Every service builds its own top-level `Config` from environment variables,
/// but the sections below (database, JWT, password hashing, mail, uploads) are
/// identical for both and are parsed here.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `SECRET_KEY`: Token signing secret, at least 32 characters (required)
/// - `ALGORITHM`: HS256, HS384 or HS512 (default: HS256)
/// - `ACCESS_TOKEN_EXPIRE_MINUTES`: Token lifetime (default: 30)
/// - `PASSWORD_HASH_MEMORY_KIB` / `PASSWORD_HASH_ITERATIONS` / `PASSWORD_HASH_PARALLELISM`
/// - `MAIL_TRANSPORT`: `smtp` or `file` (default: smtp)
/// - `MAIL_SERVER`, `MAIL_PORT`, `MAIL_USERNAME`, `MAIL_PASSWORD`, `MAIL_FROM`,
///   `MAIL_FROM_NAME`, `MAIL_STARTTLS`, `MAIL_FILE_DIR`
/// - `UPLOAD_DIR`: Directory for profile photos (default: uploads/profile_photos)
///
/// Values are read once at startup. The resulting structs are immutable and
/// handed to the components that need them.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

/// Error raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Reads an optional variable, falling back to `default`
pub fn var_or(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Reads a required variable
pub fn var_required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

/// Reads and parses an optional variable, falling back to `default`
pub fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Splits a comma separated list, dropping empty entries
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Database connection pool configuration
///
/// Only the URL and pool size are read from the environment; the timeouts keep
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Idle connections kept warm
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    pub acquire_timeout_seconds: u64,

    /// Seconds before an idle connection is closed
    pub idle_timeout_seconds: Option<u64>,

    /// Seconds before a connection is recycled
    pub max_lifetime_seconds: Option<u64>,

    /// Ping connections before handing them out
    pub test_before_acquire: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            url: var_required("DATABASE_URL")?,
            max_connections,
            min_connections: defaults.min_connections.min(max_connections),
            ..defaults
        })
    }
}

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Signing algorithm (HMAC family only)
    pub algorithm: Algorithm,

    /// Lifetime of issued access tokens, in minutes
    pub expire_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = var_required("SECRET_KEY")?;
        if secret.len() < 32 {
            return Err(ConfigError::Invalid {
                name: "SECRET_KEY",
                reason: "must be at least 32 characters long".to_string(),
            });
        }

        let algorithm = parse_algorithm(&var_or("ALGORITHM", "HS256"))?;

        let expire_minutes: i64 = parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if expire_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            secret,
            algorithm,
            expire_minutes,
        })
    }
}

/// Parses an HMAC algorithm name
///
/// Only symmetric algorithms are accepted since the signing key is a shared secret.
pub fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::Invalid {
            name: "ALGORITHM",
            reason: format!("unsupported algorithm {other}, expected HS256, HS384 or HS512"),
        }),
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP minimum recommendation for Argon2id
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        })
    }
}

/// How outbound mail is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransportConfig {
    /// SMTP relay with credentials
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        starttls: bool,
    },

    /// Write `.eml` files into a directory (development and tests)
    File { dir: PathBuf },
}

/// Outbound mail configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: MailTransportConfig,

    /// Sender address
    pub from_email: String,

    /// Sender display name
    pub from_name: String,
}

impl MailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let transport = match var_or("MAIL_TRANSPORT", "smtp").to_ascii_lowercase().as_str() {
            "smtp" => MailTransportConfig::Smtp {
                host: var_or("MAIL_SERVER", "smtp.gmail.com"),
                port: parse_or("MAIL_PORT", 587)?,
                username: var_or("MAIL_USERNAME", ""),
                password: var_or("MAIL_PASSWORD", ""),
                starttls: parse_or("MAIL_STARTTLS", true)?,
            },
            "file" => MailTransportConfig::File {
                dir: PathBuf::from(var_or("MAIL_FILE_DIR", "emails")),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "MAIL_TRANSPORT",
                    reason: format!("expected smtp or file, got {other}"),
                })
            }
        };

        let from_email = match env::var("MAIL_FROM") {
            Ok(from) => from,
            Err(_) => var_or("MAIL_USERNAME", "no-reply@secretaria-anglon.local"),
        };

        Ok(Self {
            transport,
            from_email,
            from_name: var_or("MAIL_FROM_NAME", "Secretaria AngLon"),
        })
    }
}

/// Profile photo storage configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where processed photos are written
    pub dir: PathBuf,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            dir: PathBuf::from(var_or("UPLOAD_DIR", "uploads/profile_photos")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("hs384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm(" HS512 ").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("http://a:3000, http://b:3000,,"),
            vec!["http://a:3000".to_string(), "http://b:3000".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_password_config_default() {
        let config = PasswordConfig::default();
        assert_eq!(config.memory_kib, 19456);
        assert_eq!(config.iterations, 2);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
        assert!(config.test_before_acquire);
    }
}
