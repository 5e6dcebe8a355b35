//! Sensor Hub
//!
//! Ingestion and live distribution hub for IoT climate sensor readings.
//!
//! ## Architecture (6 Components)
//!
//! 1. ReadingStore - Append-only record of readings, queryable by device
//!    and time range
//! 2. DeviceDirectory - Device listing derived from the Reading Store
//! 3. VisibilityOverlay - Hidden-device markers (presentation only)
//! 4. IngestPipeline - Normalization, storage, broadcast
//! 5. LiveFeed - Realtime fan-out to WebSocket subscribers
//! 6. WebAPI - REST + WebSocket endpoints
//!
//! ## Design Principles
//!
//! - Storage backends are swappable behind traits (MySQL or in-memory)
//! - All components are injected via `AppState`; no globals
//! - Broadcast is best-effort and never part of the ingestion contract

pub mod device_directory;
pub mod error;
pub mod ingest;
pub mod live_feed;
pub mod models;
pub mod reading_store;
pub mod state;
pub mod visibility_overlay;
pub mod web_api;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
