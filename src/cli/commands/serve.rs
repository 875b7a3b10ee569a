use anyhow::Context;
use tokio::net::TcpListener;

use crate::api::{app, with_http_layers, AppState};
use crate::auth::JwtKeys;
use crate::config;
use crate::database::{DatabaseManager, PgStore};

pub async fn handle(port: Option<u16>, migrate: bool) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting Jobly API in {:?} mode", config.environment);

    if crate::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECRET_KEY must be set in production");
    }
    let keys = JwtKeys::from_config(&config.security)?;

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if migrate {
        DatabaseManager::migrate(&pool).await?;
    }

    let state = AppState::with_pg(PgStore::new(pool.clone()), keys);
    let router = with_http_layers(app(state), config);

    let port = port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Jobly API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close(pool).await;
    Ok(())
}

pub async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config::config().database).await?;
    DatabaseManager::migrate(&pool).await?;
    DatabaseManager::close(pool).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
