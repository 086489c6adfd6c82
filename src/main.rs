use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{get_configuration, DatabaseSettings};
use chirpy::startup::run;
use chirpy::store::{InMemoryStore, PgStore, Store};
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!(error = %e, "Failed to read configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    configuration.auth.validate().map_err(|e| {
        tracing::error!(error = %e, "Invalid auth configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    tracing::info!(platform = %configuration.application.platform, "Configuration loaded");

    let store = build_store(&configuration.database).await?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(address = %address, "Server listening");

    run(listener, store, configuration)?.await
}

async fn build_store(settings: &DatabaseSettings) -> std::io::Result<Arc<dyn Store>> {
    if settings.in_memory {
        tracing::warn!("Using in-memory store; data is lost on restart");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.connection_string())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create connection pool");
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to run migrations");
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;
    tracing::info!("Database ready");

    Ok(Arc::new(PgStore::new(pool)))
}
