/// Configuration management for the admin server
///
/// # Environment Variables
///
/// - `ADMIN_HOST`: Host to bind to (default: 0.0.0.0)
/// - `ADMIN_PORT`: Port to bind to (default: 8001)
/// - `ADMIN_CORS_ORIGINS`: Comma separated allowed origins
///   (default: http://localhost:3001,http://127.0.0.1:3001)
/// - `ENVIRONMENT`: `production` enables HSTS
///
/// Database, token and hashing settings are the same variables the user API
/// reads, so both services verify each other's tokens with one secret.

use secretaria_shared::config::{
    parse_list, parse_or, var_or, DatabaseConfig, JwtConfig, PasswordConfig,
};

pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3001,http://127.0.0.1:3001";

/// Complete admin configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let server = ServerConfig {
            host: var_or("ADMIN_HOST", "0.0.0.0"),
            port: parse_or("ADMIN_PORT", 8001u16)?,
            cors_origins: parse_list(&var_or("ADMIN_CORS_ORIGINS", DEFAULT_CORS_ORIGINS)),
            production: var_or("ENVIRONMENT", "development").eq_ignore_ascii_case("production"),
        };

        Ok(Self {
            server,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            password: PasswordConfig::from_env()?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    #[test]
    fn test_bind_address() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8001,
                cors_origins: parse_list(DEFAULT_CORS_ORIGINS),
                production: false,
            },
            database: DatabaseConfig::default(),
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                algorithm: Algorithm::HS256,
                expire_minutes: 30,
            },
            password: PasswordConfig::default(),
        };

        assert_eq!(config.bind_address(), "127.0.0.1:8001");
        assert_eq!(config.server.cors_origins.len(), 2);
    }
}
