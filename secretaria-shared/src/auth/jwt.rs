/// JWT token issuance and verification
///
/// Tokens are stateless bearer credentials signed with an HMAC algorithm. They
/// carry the user ID as subject and an absolute expiry. There is no refresh or
/// revocation: a token stays valid until its `exp` second has passed.
///
/// # Security
///
/// - **Algorithm**: HS256 by default, HS384/HS512 configurable
/// - **Expiration**: Caller supplied, 15 minutes when unspecified
/// - **Validation**: Signature, expiration, not-before and issuer, zero leeway
///
/// # Expiry boundary
///
/// A token is accepted while `now <= exp` and rejected once `now > exp`, both
/// in whole seconds. [`Claims::is_expired`] follows the same rule as the
/// verifier.
///
/// # Example
///
/// ```
/// use secretaria_shared::auth::jwt::{TokenIssuer, TokenScope};
/// use jsonwebtoken::Algorithm;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new("a-secret-that-is-at-least-32-bytes!", Algorithm::HS256);
/// let user_id = Uuid::new_v4();
///
/// let token = issuer.issue(user_id, TokenScope::App, None)?;
/// let claims = issuer.verify(&token)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "secretaria";

/// Lifetime used when the caller does not pass one
pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was minted for another service
    #[error("Token scope {actual:?} is not accepted here")]
    WrongScope { actual: TokenScope },
}

/// Which service a token was issued by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    /// Issued by the user API login
    App,

    /// Issued by the admin API login
    Admin,
}

/// JWT claims structure
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "secretaria")
/// - `iat` / `nbf`: Issue time
/// - `exp`: Expiration timestamp
/// - `scope`: Issuing service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "secretaria"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Issuing service
    pub scope: TokenScope,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    pub fn with_expiration(user_id: Uuid, scope: TokenScope, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            scope,
        }
    }

    /// Creates claims with the default 15 minute lifetime
    pub fn new(user_id: Uuid, scope: TokenScope) -> Self {
        Self::with_expiration(user_id, scope, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp >= now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Token issuer/verifier holding the process-wide signing key
///
/// Built once at startup from [`JwtConfig`] and shared through application
/// state. Cloning is cheap enough to do per service, but callers normally
/// keep one behind an `Arc`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer with the 15 minute default lifetime
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            default_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }

    /// Creates an issuer whose default lifetime comes from configuration
    pub fn from_config(config: &JwtConfig) -> Self {
        let mut issuer = Self::new(&config.secret, config.algorithm);
        issuer.default_ttl = Duration::minutes(config.expire_minutes);
        issuer
    }

    /// Lifetime applied when `issue` gets no explicit TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Signs a token for `subject` expiring after `ttl` (or the default)
    pub fn issue(
        &self,
        subject: Uuid,
        scope: TokenScope,
        ttl: Option<Duration>,
    ) -> Result<String, JwtError> {
        let claims = Claims::with_expiration(subject, scope, ttl.unwrap_or(self.default_ttl));
        self.encode(&claims)
    }

    /// Signs arbitrary claims
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token and extracts claims
    ///
    /// Fails when the signature does not match, the subject is missing or not
    /// a UUID, the issuer differs, or the expiry second has passed.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validates a token and requires it to carry `scope`
    pub fn verify_scoped(&self, token: &str, scope: TokenScope) -> Result<Claims, JwtError> {
        let claims = self.verify(token)?;

        if claims.scope != scope {
            return Err(JwtError::WrongScope {
                actual: claims.scope,
            });
        }

        Ok(claims)
    }
}
