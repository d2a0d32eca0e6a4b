/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (skipped without `DATABASE_URL`)
/// - Test user creation and bearer token
/// - A capturing notifier in place of the SMTP relay
/// - Request helpers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use jsonwebtoken::Algorithm;
use secretaria_api::app::{build_router, AppState};
use secretaria_api::config::{ApiConfig, Config};
use secretaria_shared::auth::jwt::{TokenIssuer, TokenScope};
use secretaria_shared::auth::password::PasswordHasher;
use secretaria_shared::config::{
    DatabaseConfig, JwtConfig, MailConfig, MailTransportConfig, PasswordConfig, UploadConfig,
};
use secretaria_shared::db::{migrations::run_migrations, pool::create_pool};
use secretaria_shared::mail::MockNotifier;
use secretaria_shared::models::user::{CreateUser, User};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const TEST_PASSWORD: &str = "password123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub notifier: Arc<MockNotifier>,
    pub tokens: TokenIssuer,
    pub upload_dir: TempDir,
    pub user: User,
    pub jwt_token: String,
}

fn test_config(database_url: String, scratch: &TempDir, upload_dir: &TempDir) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
            min_connections: 1,
            ..Default::default()
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            algorithm: Algorithm::HS256,
            expire_minutes: 30,
        },
        password: test_password_config(),
        mail: MailConfig {
            transport: MailTransportConfig::File {
                dir: scratch.path().to_path_buf(),
            },
            from_email: "no-reply@example.com".to_string(),
            from_name: "Secretaria AngLon".to_string(),
        },
        upload: UploadConfig {
            dir: upload_dir.path().to_path_buf(),
        },
    }
}

fn test_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

impl TestContext {
    /// Creates a new test context, or `None` when no database is configured
    pub async fn new() -> Option<Self> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        };

        let scratch = TempDir::new().expect("scratch dir");
        let upload_dir = TempDir::new().expect("upload dir");
        let config = test_config(database_url, &scratch, &upload_dir);

        let db = create_pool(&config.database).await.expect("Failed to connect");
        run_migrations(&db).await.expect("Failed to run migrations");

        let user = create_user(&db, "test").await;

        let tokens = TokenIssuer::from_config(&config.jwt);
        let jwt_token = tokens
            .issue(user.id, TokenScope::App, None)
            .expect("Failed to issue token");

        let notifier = Arc::new(MockNotifier::new());
        let state = AppState::new(db.clone(), config)
            .expect("Failed to build state")
            .with_notifier(notifier.clone());
        let app = build_router(state);

        Some(Self {
            db,
            app,
            notifier,
            tokens,
            upload_dir,
            user,
            jwt_token,
        })
    }

    /// Gets authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Sends a request through the router, returning status and JSON body
    ///
    /// Non-JSON bodies come back as `Value::Null`.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    /// Sends a JSON request, with a bearer token when given
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(json_request(method, uri, token, body)).await
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Unique name usable as username and email local part
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
}

/// Inserts an active user with password [`TEST_PASSWORD`]
pub async fn create_user(db: &PgPool, prefix: &str) -> User {
    let name = unique(prefix);
    let hasher = PasswordHasher::new(test_password_config()).expect("valid params");

    User::create(
        db,
        CreateUser {
            email: format!("{}@example.com", name),
            username: name,
            password_hash: hasher.hash(TEST_PASSWORD).expect("hash"),
            full_name: Some("Test User".to_string()),
            phone_number: None,
            is_active: true,
            is_admin: false,
        },
    )
    .await
    .expect("Failed to create user")
}

/// Multipart body with one `file` field
pub fn multipart_request(uri: &str, token: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "secretaria-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}
