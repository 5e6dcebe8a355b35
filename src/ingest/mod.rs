//! IngestPipeline - Reading Normalization and Storage
//!
//! ## Responsibilities
//!
//! - Normalize inbound payloads (numeric coercion, timestamp and name
//!   resolution)
//! - Persist the normalized reading
//! - Broadcast it to live-feed subscribers
//!
//! Both the REST path and the WebSocket path converge here, so every
//! subscriber observes the canonical stored form of a reading. Success
//! is reported as soon as the store accepts the reading; the broadcast
//! is best-effort and cannot fail the caller.

mod types;

pub use types::SensorPayload;

use crate::error::Result;
use crate::live_feed::{FeedMessage, LiveFeed};
use crate::reading_store::{Reading, ReadingStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Display name stored when a device did not send one
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown device";

/// Ingestion pipeline instance
pub struct IngestPipeline {
    readings: ReadingStore,
    feed: Arc<LiveFeed>,
}

impl IngestPipeline {
    /// Create new pipeline
    pub fn new(readings: ReadingStore, feed: Arc<LiveFeed>) -> Self {
        Self { readings, feed }
    }

    /// Normalize, store, and broadcast one reading.
    ///
    /// Returns the stored reading. Fails only when the store does;
    /// a failed store publishes nothing.
    pub async fn ingest(&self, payload: SensorPayload) -> Result<Reading> {
        let reading = normalize(payload, Utc::now());

        self.readings.append(&reading).await?;
        tracing::debug!(
            device_id = %reading.device_id,
            temperature = reading.temperature,
            humidity = reading.humidity,
            "Reading stored"
        );

        self.feed
            .publish(FeedMessage::NewData(reading.clone()))
            .await;

        Ok(reading)
    }
}

/// Apply the normalization rules to a raw payload.
///
/// `received_at` becomes the timestamp when the payload carries none or
/// an unparseable one.
pub fn normalize(payload: SensorPayload, received_at: DateTime<Utc>) -> Reading {
    let device_name = match payload.device_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => UNKNOWN_DEVICE_NAME.to_string(),
    };

    let timestamp = payload
        .timestamp
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(received_at);

    Reading {
        device_id: payload.device_id,
        device_name,
        temperature: payload.temperature,
        humidity: payload.humidity,
        timestamp,
    }
}
