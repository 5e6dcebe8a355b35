//! ReadingStore - Durable Record of Sensor Readings
//!
//! ## Responsibilities
//!
//! - Append-only persistence of readings
//! - Latest-per-device and historical range queries
//! - Distinct device id listing (blank ids excluded)
//! - Bulk reset (administrative)
//!
//! The store performs no validation beyond what the backend types
//! enforce; normalization happens in the ingest pipeline. Backends are
//! swappable behind [`ReadingBackend`]: MySQL for production, an
//! in-memory map when no database is configured and for tests. Every
//! facade call is bounded by a timeout so a stalled backend fails the
//! caller instead of hanging.

mod memory;
mod repository;
mod types;

pub use memory::MemoryReadingBackend;
pub use repository::MySqlReadingBackend;
pub use types::{RangeFilter, Reading};

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Storage backend contract for sensor readings
#[async_trait]
pub trait ReadingBackend: Send + Sync {
    /// Persist one reading; visible to all subsequent queries
    async fn append(&self, reading: &Reading) -> Result<()>;

    /// Reading with the maximum timestamp for every distinct device id.
    /// Equal timestamps resolve to the most recently appended reading.
    async fn latest_per_device(&self) -> Result<HashMap<String, Reading>>;

    /// Readings matching the filter, ordered by timestamp ascending
    /// (ties in insertion order)
    async fn query_range(&self, filter: &RangeFilter) -> Result<Vec<Reading>>;

    /// All device ids ever stored, excluding blank/whitespace-only
    /// values, sorted ascending
    async fn distinct_device_ids(&self) -> Result<Vec<String>>;

    /// Delete every reading. Irreversible.
    async fn clear(&self) -> Result<()>;
}

/// Timeout-bounded facade over a [`ReadingBackend`]
#[derive(Clone)]
pub struct ReadingStore {
    backend: Arc<dyn ReadingBackend>,
    op_timeout: Duration,
}

impl ReadingStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn ReadingBackend>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
        }
    }

    /// Create a store over a fresh in-memory backend
    pub fn in_memory(op_timeout: Duration) -> Self {
        Self::new(Arc::new(MemoryReadingBackend::new()), op_timeout)
    }

    /// Persist one reading
    pub async fn append(&self, reading: &Reading) -> Result<()> {
        self.bounded(self.backend.append(reading)).await
    }

    /// Latest reading per distinct device id
    pub async fn latest_per_device(&self) -> Result<HashMap<String, Reading>> {
        self.bounded(self.backend.latest_per_device()).await
    }

    /// Readings in the (inclusive) range, optionally filtered by device
    pub async fn query_range(&self, filter: &RangeFilter) -> Result<Vec<Reading>> {
        self.bounded(self.backend.query_range(filter)).await
    }

    /// Distinct non-blank device ids
    pub async fn distinct_device_ids(&self) -> Result<Vec<String>> {
        self.bounded(self.backend.distinct_device_ids()).await
    }

    /// Delete every reading. Administrative reset, not part of normal
    /// ingestion flow.
    pub async fn clear(&self) -> Result<()> {
        self.bounded(self.backend.clear()).await
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>> + Send) -> Result<T> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| {
                Error::StorageUnavailable(format!(
                    "storage operation exceeded {}s",
                    self.op_timeout.as_secs()
                ))
            })?
    }
}
