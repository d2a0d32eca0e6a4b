/// Shared setup for admin integration tests
///
/// Requires `DATABASE_URL`; without it `TestContext::new` returns `None`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use jsonwebtoken::Algorithm;
use secretaria_admin::app::{build_router, AppState};
use secretaria_admin::config::{Config, ServerConfig};
use secretaria_shared::auth::jwt::{TokenIssuer, TokenScope};
use secretaria_shared::auth::password::PasswordHasher;
use secretaria_shared::config::{DatabaseConfig, JwtConfig, PasswordConfig};
use secretaria_shared::db::{migrations::run_migrations, pool::create_pool};
use secretaria_shared::models::user::{CreateUser, User};
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub tokens: TokenIssuer,
    pub admin: User,
    pub admin_token: String,
}

fn password_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return None;
        };

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["http://localhost:3001".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
                min_connections: 1,
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "integration-test-secret-at-least-32-bytes".to_string(),
                algorithm: Algorithm::HS256,
                expire_minutes: 30,
            },
            password: password_config(),
        };

        let db = create_pool(&config.database).await.expect("Failed to connect");
        run_migrations(&db).await.expect("Failed to run migrations");

        let admin = create_user(&db, "admin", true).await;
        let tokens = TokenIssuer::from_config(&config.jwt);
        let admin_token = tokens.issue(admin.id, TokenScope::Admin, None).expect("token");

        let state = AppState::new(db.clone(), config).expect("Failed to build state");

        Some(Self {
            db,
            app: build_router(state),
            tokens,
            admin,
            admin_token,
        })
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
}

pub async fn create_user(db: &PgPool, prefix: &str, is_admin: bool) -> User {
    let name = unique(prefix);
    let hasher = PasswordHasher::new(password_config()).expect("valid params");

    User::create(
        db,
        CreateUser {
            email: format!("{}@example.com", name),
            username: name,
            password_hash: hasher.hash(TEST_PASSWORD).expect("hash"),
            full_name: None,
            phone_number: None,
            is_active: true,
            is_admin,
        },
    )
    .await
    .expect("Failed to create user")
}
