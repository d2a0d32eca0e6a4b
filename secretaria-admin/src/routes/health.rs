use crate::app::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Secretaria AngLon Admin API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness plus database reachability
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let connected = secretaria_shared::db::pool::health_check(&state.db).await.is_ok();

    Json(json!({
        "status": if connected { "healthy" } else { "degraded" },
        "service": "secretaria-admin",
        "version": env!("CARGO_PKG_VERSION"),
        "database": if connected { "connected" } else { "disconnected" },
    }))
}
