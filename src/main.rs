// Weather Harvester v0.1
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod errors;
mod services;

use config::AppConfig;
use db::PgDocumentStore;
use errors::AppError;
use services::ingest::{self, INTER_CITY_DELAY};
use services::openweather::OpenWeatherClient;

/// Maximum number of connections in the database pool. The run is fully
/// sequential, so a small pool is plenty.
const DB_POOL_MAX_CONNECTIONS: u32 = 2;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_harvester=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Per-city failures are absorbed inside the run; only the fatal tier
    // (config, catalog, pool, migrations) reaches this handler.
    if let Err(e) = run().await {
        tracing::error!("Run aborted: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;

    let cities = services::catalog::load_catalog_file(Path::new(&config.catalog_path))?;
    tracing::info!("Loaded {} cities from {}", cities.len(), config.catalog_path);

    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations completed");

    let client = OpenWeatherClient::new(&config.openweather_api_key);
    let store = PgDocumentStore::new(pool);

    let outcome = ingest::run_catalog(&client, &store, &cities, INTER_CITY_DELAY).await;

    tracing::info!(
        "Weather run complete: {} cities saved, {} failed",
        outcome.saved,
        outcome.failed
    );

    Ok(())
}
