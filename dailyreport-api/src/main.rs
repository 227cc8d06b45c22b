//! # Daily Report API Server
//!
//! HTTP server for daily reports and task assignment.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment
//! 2. Connect to PostgreSQL and apply pending migrations
//! 3. Build the router and serve until Ctrl-C
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p dailyreport-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use dailyreport_api::{
    app::{build_router, AppState},
    config::Config,
};
use dailyreport_shared::db::{
    migrations::{get_migration_status, run_migrations},
    pool::{close_pool, create_pool, get_pool_stats, DatabaseConfig},
};
use dailyreport_shared::store::postgres::PgStore;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Daily Report API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::with_url(config.database.url.clone())
    })
    .await?;
    run_migrations(&pool).await?;

    let migrations = get_migration_status(&pool).await?;
    let stats = get_pool_stats(&pool);
    tracing::info!(
        applied_migrations = migrations.applied_migrations,
        latest_version = ?migrations.latest_version,
        connections = stats.total_connections,
        "Database ready"
    );

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "dailyreport_api=debug,dailyreport_shared=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
