//! Shared data models

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Active storage backend ("mysql" or "memory")
    pub storage: String,
    /// Currently connected live-feed subscribers
    pub subscribers: u64,
}
