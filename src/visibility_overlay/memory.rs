//! In-memory visibility backend

use super::VisibilityBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Volatile hidden-device set used when no database is configured, and
/// by tests
#[derive(Default)]
pub struct MemoryVisibilityBackend {
    hidden: RwLock<HashSet<String>>,
}

impl MemoryVisibilityBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisibilityBackend for MemoryVisibilityBackend {
    async fn hide(&self, device_id: &str) -> Result<()> {
        self.hidden.write().await.insert(device_id.to_string());
        Ok(())
    }

    async fn unhide(&self, device_id: &str) -> Result<()> {
        self.hidden.write().await.remove(device_id);
        Ok(())
    }

    async fn list_hidden(&self) -> Result<Vec<String>> {
        let hidden = self.hidden.read().await;
        let mut ids: Vec<String> = hidden.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
