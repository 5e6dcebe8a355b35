//! DeviceDirectory - Derived Device Listing
//!
//! ## Responsibilities
//!
//! - Resolve a display name per device (name of the most recent reading)
//! - List distinct device ids
//!
//! The directory is always derived from the Reading Store, never stored
//! independently, so it cannot drift from the readings beyond
//! construction-time staleness.

use crate::error::Result;
use crate::reading_store::ReadingStore;
use serde::{Deserialize, Serialize};

/// Device id with its resolved display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub device_id: String,
    pub device_name: String,
}

/// Directory over the Reading Store
#[derive(Clone)]
pub struct DeviceDirectory {
    readings: ReadingStore,
}

impl DeviceDirectory {
    /// Create new directory
    pub fn new(readings: ReadingStore) -> Self {
        Self { readings }
    }

    /// One summary per distinct device, sorted by display name.
    ///
    /// The name comes from the device's most recent reading; a device
    /// whose latest reading carries a blank name falls back to its id.
    /// Blank device ids are excluded.
    pub async fn list_summaries(&self) -> Result<Vec<DeviceSummary>> {
        let latest = self.readings.latest_per_device().await?;

        let mut summaries: Vec<DeviceSummary> = latest
            .into_iter()
            .filter(|(device_id, _)| !device_id.trim().is_empty())
            .map(|(device_id, reading)| {
                let device_name = if reading.device_name.trim().is_empty() {
                    device_id.clone()
                } else {
                    reading.device_name
                };
                DeviceSummary {
                    device_id,
                    device_name,
                }
            })
            .collect();

        summaries.sort_by(|a, b| {
            a.device_name
                .cmp(&b.device_name)
                .then_with(|| a.device_id.cmp(&b.device_id))
        });

        Ok(summaries)
    }

    /// Distinct non-blank device ids with no name resolution
    pub async fn list_device_ids(&self) -> Result<Vec<String>> {
        self.readings.distinct_device_ids().await
    }
}
