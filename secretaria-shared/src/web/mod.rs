/// HTTP plumbing shared by the user API and the admin API
///
/// Both binaries build their routers the same way: tracing subscriber set up
/// from `RUST_LOG` / `LOG_FORMAT`, a CORS policy from a configured origin
/// list, security headers, one JSON error shape (extractor rejections
/// included), and graceful shutdown on Ctrl-C or SIGTERM.

pub mod error;
pub mod extract;
pub mod security;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber
///
/// `RUST_LOG` overrides `default_filter`. `LOG_FORMAT=json` switches to
/// one JSON object per line.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Exact origins accepted by the CORS policy
///
/// Entries containing `*` are host patterns, which browsers never send and
/// the CORS layer cannot match; they are dropped. A lone `*` is handled by
/// [`cors_layer`] instead.
pub fn exact_origins(configured: &[String]) -> Vec<HeaderValue> {
    configured
        .iter()
        .filter_map(|origin| {
            if origin.contains('*') {
                warn!(%origin, "Ignoring wildcard CORS origin pattern");
                return None;
            }
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect()
}

/// Builds the CORS layer for a configured origin list
pub fn cors_layer(configured: &[String]) -> CorsLayer {
    if configured.len() == 1 && configured[0] == "*" {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(exact_origins(configured))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
