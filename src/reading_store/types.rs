//! Reading Store domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped sensor observation for a device.
///
/// Immutable once stored. `temperature`/`humidity` carry NaN when the
/// device sent a non-numeric value (serialized as JSON null).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub device_id: String,
    pub device_name: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
}

/// Filter for historical range queries.
///
/// All fields optional: no bounds returns every reading, bounds are
/// inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct RangeFilter {
    pub device_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl RangeFilter {
    /// True when the reading falls inside this filter
    pub fn matches(&self, reading: &Reading) -> bool {
        if let Some(device_id) = &self.device_id {
            if &reading.device_id != device_id {
                return false;
            }
        }
        if let Some(start) = self.start {
            if reading.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if reading.timestamp > end {
                return false;
            }
        }
        true
    }
}
