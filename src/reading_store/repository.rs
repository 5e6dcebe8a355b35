//! MySQL reading backend
//!
//! Database access layer for the Reading Store. Readings are append-only;
//! the auto-increment `id` column provides the tie-break order for equal
//! timestamps (higher id = appended later).

use super::types::{RangeFilter, Reading};
use super::ReadingBackend;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use std::collections::HashMap;

/// Reading SELECT columns
const READING_COLUMNS: &str = "device_id, device_name, temperature, humidity, recorded_at";

/// Persistent backend over a MySQL pool
#[derive(Clone)]
pub struct MySqlReadingBackend {
    pool: MySqlPool,
}

/// Row shape; DOUBLE columns are NULL when the device sent a
/// non-numeric value.
#[derive(sqlx::FromRow)]
struct ReadingRow {
    device_id: String,
    device_name: String,
    temperature: Option<f64>,
    humidity: Option<f64>,
    recorded_at: DateTime<Utc>,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Self {
            device_id: row.device_id,
            device_name: row.device_name,
            temperature: row.temperature.unwrap_or(f64::NAN),
            humidity: row.humidity.unwrap_or(f64::NAN),
            timestamp: row.recorded_at,
        }
    }
}

/// MySQL DOUBLE cannot hold NaN/inf; map them to NULL
fn db_value(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl MySqlReadingBackend {
    /// Create new backend
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the readings table if missing (additive-only schema)
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                device_id VARCHAR(64) NOT NULL,
                device_name VARCHAR(255) NOT NULL,
                temperature DOUBLE NULL,
                humidity DOUBLE NULL,
                recorded_at DATETIME(3) NOT NULL,
                INDEX idx_readings_device_time (device_id, recorded_at)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ReadingBackend for MySqlReadingBackend {
    async fn append(&self, reading: &Reading) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO readings (device_id, device_name, temperature, humidity, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reading.device_id)
        .bind(&reading.device_name)
        .bind(db_value(reading.temperature))
        .bind(db_value(reading.humidity))
        .bind(reading.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_per_device(&self) -> Result<HashMap<String, Reading>> {
        let query = format!(
            r#"
            SELECT {} FROM readings r
            WHERE r.id = (
                SELECT r2.id FROM readings r2
                WHERE r2.device_id = r.device_id
                ORDER BY r2.recorded_at DESC, r2.id DESC
                LIMIT 1
            )
            "#,
            READING_COLUMNS
        );
        let rows = sqlx::query_as::<_, ReadingRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.device_id.clone(), Reading::from(row)))
            .collect())
    }

    async fn query_range(&self, filter: &RangeFilter) -> Result<Vec<Reading>> {
        let mut query = format!("SELECT {} FROM readings WHERE 1 = 1", READING_COLUMNS);
        if filter.device_id.is_some() {
            query.push_str(" AND device_id = ?");
        }
        if filter.start.is_some() {
            query.push_str(" AND recorded_at >= ?");
        }
        if filter.end.is_some() {
            query.push_str(" AND recorded_at <= ?");
        }
        query.push_str(" ORDER BY recorded_at ASC, id ASC");

        let mut q = sqlx::query_as::<_, ReadingRow>(&query);
        if let Some(device_id) = &filter.device_id {
            q = q.bind(device_id);
        }
        if let Some(start) = filter.start {
            q = q.bind(start);
        }
        if let Some(end) = filter.end {
            q = q.bind(end);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Reading::from).collect())
    }

    async fn distinct_device_ids(&self) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT device_id FROM readings WHERE TRIM(device_id) <> '' ORDER BY device_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM readings").execute(&self.pool).await?;
        Ok(())
    }
}
