//! Sensor Hub server
//!
//! Main entry point: configuration, storage initialization
//! (connect-or-fail), component wiring, router startup.

use sensor_hub::{
    device_directory::DeviceDirectory,
    ingest::IngestPipeline,
    live_feed::LiveFeed,
    reading_store::{MySqlReadingBackend, ReadingStore},
    state::{AppConfig, AppState},
    visibility_overlay::{MySqlVisibilityBackend, VisibilityOverlay},
    web_api,
};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensor_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sensor-hub v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::default();
    let op_timeout = config.storage_timeout();

    // Storage: connect-or-fail at startup when a database is configured,
    // volatile in-memory otherwise
    let (readings, visibility) = match &config.database_url {
        Some(url) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await?;

            let reading_backend = MySqlReadingBackend::new(pool.clone());
            reading_backend.ensure_schema().await?;
            let visibility_backend = MySqlVisibilityBackend::new(pool);
            visibility_backend.ensure_schema().await?;

            tracing::info!("Database connected");
            (
                ReadingStore::new(Arc::new(reading_backend), op_timeout),
                VisibilityOverlay::new(Arc::new(visibility_backend), op_timeout),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set, readings are stored in memory only");
            (
                ReadingStore::in_memory(op_timeout),
                VisibilityOverlay::in_memory(op_timeout),
            )
        }
    };

    let feed = Arc::new(LiveFeed::new(config.feed_queue_capacity));
    let ingest = Arc::new(IngestPipeline::new(readings.clone(), feed.clone()));
    let directory = DeviceDirectory::new(readings.clone());

    let state = AppState {
        config,
        readings,
        visibility,
        directory,
        ingest,
        feed,
    };

    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
