//! # Secretaria AngLon Admin Server
//!
//! Administrative API on its own port (8001 by default): user management,
//! statistics and the audit log.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p secretaria-admin
//! ```

use secretaria_admin::{
    app::{build_router, AppState},
    config::Config,
};
use secretaria_shared::{
    db::{
        migrations::get_migration_status,
        pool::{close_pool, create_pool, health_check},
    },
    web::{init_tracing, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing("secretaria_admin=debug,secretaria_shared=debug,tower_http=debug");

    tracing::info!(
        "Secretaria AngLon Admin Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let pool = create_pool(&config.database).await?;
    health_check(&pool).await?;

    // Migrations are applied by secretaria-api
    let status = get_migration_status(&pool).await?;
    if !status.is_up_to_date {
        tracing::warn!(
            applied = status.applied_migrations,
            "Database schema is behind this build; start secretaria-api to migrate"
        );
    }

    let state = AppState::new(pool.clone(), config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Admin server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Admin server stopped");

    Ok(())
}
