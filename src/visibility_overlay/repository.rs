//! MySQL visibility backend
//!
//! One row per hidden device, keyed by device id. Hide is an upsert and
//! unhide a plain delete, so both stay idempotent at the SQL level.

use super::VisibilityBackend;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Persistent backend over a MySQL pool
#[derive(Clone)]
pub struct MySqlVisibilityBackend {
    pool: MySqlPool,
}

impl MySqlVisibilityBackend {
    /// Create new backend
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the hidden_devices table if missing
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hidden_devices (
                device_id VARCHAR(64) NOT NULL PRIMARY KEY,
                hidden_at DATETIME(3) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl VisibilityBackend for MySqlVisibilityBackend {
    async fn hide(&self, device_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hidden_devices (device_id, hidden_at)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE device_id = device_id
            "#,
        )
        .bind(device_id)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unhide(&self, device_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM hidden_devices WHERE device_id = ?")
            .bind(device_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_hidden(&self) -> Result<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT device_id FROM hidden_devices ORDER BY device_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }
}
