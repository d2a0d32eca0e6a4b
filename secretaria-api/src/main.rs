//! # Secretaria AngLon API Server
//!
//! User-facing HTTP service: accounts, tasks, calendar events and profile
//! photos.
//!
//! ## Startup
//!
//! 1. Load `.env` and parse [`Config`]
//! 2. Connect the pool, check it, run embedded migrations
//! 3. Build the router and serve until Ctrl-C / SIGTERM
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p secretaria-api
//! ```

use secretaria_api::{
    app::{build_router, AppState},
    config::Config,
};
use secretaria_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, health_check},
    },
    web::{init_tracing, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing("secretaria_api=debug,secretaria_shared=debug,tower_http=debug");

    tracing::info!(
        "Secretaria AngLon API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let pool = create_pool(&config.database).await?;
    health_check(&pool).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.upload.dir).await?;

    let state = AppState::new(pool.clone(), config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
