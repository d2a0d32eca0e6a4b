/// Welcome and health check endpoints
///
/// # Endpoints
///
/// ```text
/// GET /        → {"message": ..., "version": ...}
/// GET /health  → {"status": "healthy", "service": "secretaria-api", ...}
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Welcome response
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the database is unreachable
    pub status: String,

    /// Service name
    pub service: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the Secretaria AngLon API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check handler
///
/// Returns service health status including database connectivity.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = secretaria_shared::db::pool::health_check(&state.db).await.is_ok();

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        service: "secretaria-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}
