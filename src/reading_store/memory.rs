//! In-memory reading backend
//!
//! Append-only `Vec` behind an async `RwLock`. Insertion order doubles as
//! the tie-break order for equal timestamps: the most recently appended
//! reading wins in `latest_per_device`.

use super::types::{RangeFilter, Reading};
use super::ReadingBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Volatile backend used when no database is configured, and by tests
#[derive(Default)]
pub struct MemoryReadingBackend {
    rows: RwLock<Vec<Reading>>,
}

impl MemoryReadingBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingBackend for MemoryReadingBackend {
    async fn append(&self, reading: &Reading) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.push(reading.clone());
        Ok(())
    }

    async fn latest_per_device(&self) -> Result<HashMap<String, Reading>> {
        let rows = self.rows.read().await;
        let mut latest: HashMap<String, Reading> = HashMap::new();
        for reading in rows.iter() {
            match latest.get(&reading.device_id) {
                // Equal timestamps fall through to the insert, so the
                // most recently appended reading wins.
                Some(current) if current.timestamp > reading.timestamp => {}
                _ => {
                    latest.insert(reading.device_id.clone(), reading.clone());
                }
            }
        }
        Ok(latest)
    }

    async fn query_range(&self, filter: &RangeFilter) -> Result<Vec<Reading>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Reading> = rows
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        matched.sort_by_key(|r| r.timestamp);
        Ok(matched)
    }

    async fn distinct_device_ids(&self) -> Result<Vec<String>> {
        let rows = self.rows.read().await;
        let ids: BTreeSet<String> = rows
            .iter()
            .filter(|r| !r.device_id.trim().is_empty())
            .map(|r| r.device_id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.rows.write().await.clear();
        Ok(())
    }
}
