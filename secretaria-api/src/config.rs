/// Configuration management for the user API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. The shared sections (database, JWT,
/// password hashing, mail, uploads) are parsed by `secretaria_shared::config`.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8000)
/// - `CORS_ORIGINS`: Comma separated allowed origins
///   (default: http://localhost:3000,http://127.0.0.1:3000)
/// - `ENVIRONMENT`: `production` enables HSTS (default: development)
/// - `RUST_LOG`: Log filter (default: debug for this crate)
///
/// # Example
///
/// ```no_run
/// use secretaria_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use secretaria_shared::config::{
    parse_list, parse_or, var_or, DatabaseConfig, JwtConfig, MailConfig, PasswordConfig,
    UploadConfig,
};

/// Default origins of the web front-end in development
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// Argon2 cost parameters
    pub password: PasswordConfig,

    /// Outbound mail for reset codes
    pub mail: MailConfig,

    /// Profile photo storage
    pub upload: UploadConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins, exactly as configured
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        let api = ApiConfig {
            host: var_or("API_HOST", "0.0.0.0"),
            port: parse_or("API_PORT", 8000u16)?,
            cors_origins: parse_list(&var_or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
            production: var_or("ENVIRONMENT", "development").eq_ignore_ascii_case("production"),
        };

        Ok(Self {
            api,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            password: PasswordConfig::from_env()?,
            mail: MailConfig::from_env()?,
            upload: UploadConfig::from_env(),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
