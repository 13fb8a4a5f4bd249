use std::sync::Arc;

use anyhow::Context;
use mentor_api_rust::{
    app::{app, AppState},
    auth::JwtKeys,
    config,
    database::DatabaseManager,
    store::PgStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .init();

    let config = config::config();
    tracing::info!("Starting Mentor API in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        database.migrate().await?;
    }

    let jwt = JwtKeys::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)
        .context("SECURITY_JWT_SECRET must be set")?;
    let store = Arc::new(PgStore::new(&database));
    let state = AppState::new(store, jwt, config).with_database(database.clone());

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Mentor API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}
