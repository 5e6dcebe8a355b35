//! VisibilityOverlay - Hidden Device Markers
//!
//! ## Responsibilities
//!
//! - Mark devices as hidden (idempotent upsert)
//! - Unmark them (idempotent delete)
//! - List the hidden set
//!
//! The overlay is informational only: it does not filter the Reading
//! Store or the Device Directory. Presentation layers are responsible
//! for subtracting hidden ids from directory and query results. Hiding a
//! device leaves its readings untouched.

mod memory;
mod repository;

pub use memory::MemoryVisibilityBackend;
pub use repository::MySqlVisibilityBackend;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Storage backend contract for the hidden-device set
#[async_trait]
pub trait VisibilityBackend: Send + Sync {
    /// Add the device id to the hidden set; no error if already present
    async fn hide(&self, device_id: &str) -> Result<()>;

    /// Remove the device id from the hidden set; no error if absent
    async fn unhide(&self, device_id: &str) -> Result<()>;

    /// Hidden device ids, sorted ascending
    async fn list_hidden(&self) -> Result<Vec<String>>;
}

/// Timeout-bounded facade over a [`VisibilityBackend`]
#[derive(Clone)]
pub struct VisibilityOverlay {
    backend: Arc<dyn VisibilityBackend>,
    op_timeout: Duration,
}

impl VisibilityOverlay {
    /// Create an overlay over the given backend
    pub fn new(backend: Arc<dyn VisibilityBackend>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
        }
    }

    /// Create an overlay over a fresh in-memory backend
    pub fn in_memory(op_timeout: Duration) -> Self {
        Self::new(Arc::new(MemoryVisibilityBackend::new()), op_timeout)
    }

    /// Hide a device. Blank ids are rejected; the overlay keys on
    /// meaningful device ids only.
    pub async fn hide(&self, device_id: &str) -> Result<()> {
        Self::validate_id(device_id)?;
        self.bounded(self.backend.hide(device_id)).await
    }

    /// Unhide a device
    pub async fn unhide(&self, device_id: &str) -> Result<()> {
        Self::validate_id(device_id)?;
        self.bounded(self.backend.unhide(device_id)).await
    }

    /// Hidden device ids, sorted ascending
    pub async fn list_hidden(&self) -> Result<Vec<String>> {
        self.bounded(self.backend.list_hidden()).await
    }

    fn validate_id(device_id: &str) -> Result<()> {
        if device_id.trim().is_empty() {
            return Err(Error::Validation("deviceId must not be blank".to_string()));
        }
        Ok(())
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
