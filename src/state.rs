//! Application state
//!
//! Holds all shared components and state. Everything is constructed in
//! `main` and injected here; handlers never reach for globals.

use crate::device_directory::DeviceDirectory;
use crate::ingest::IngestPipeline;
use crate::live_feed::LiveFeed;
use crate::reading_store::ReadingStore;
use crate::visibility_overlay::VisibilityOverlay;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL; in-memory storage when unset
    pub database_url: Option<String>,
    /// Upper bound for a single storage operation
    pub storage_timeout_sec: u64,
    /// Per-subscriber live-feed queue capacity
    pub feed_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            storage_timeout_sec: std::env::var("STORAGE_TIMEOUT_SEC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            feed_queue_capacity: std::env::var("FEED_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::live_feed::DEFAULT_QUEUE_CAPACITY),
        }
    }
}

impl AppConfig {
    /// Storage operation timeout as a `Duration`
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_sec)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Reading Store (append + queries)
    pub readings: ReadingStore,
    /// Visibility Overlay (hidden-device markers)
    pub visibility: VisibilityOverlay,
    /// Device Directory (derived listing)
    pub directory: DeviceDirectory,
    /// Ingestion pipeline (normalize + store + broadcast)
    pub ingest: Arc<IngestPipeline>,
    /// LiveFeed (WebSocket fan-out)
    pub feed: Arc<LiveFeed>,
}
