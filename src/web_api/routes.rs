//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ingest::SensorPayload;
use crate::live_feed::{FeedError, FeedMessage};
use crate::reading_store::{RangeFilter, Reading};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Ingestion
        .route("/api/sensor-data", post(ingest_reading))
        // Queries
        .route("/api/latest-data", get(latest_data))
        .route("/api/historical-data", get(historical_data))
        .route("/api/device-list", get(device_list))
        // Visibility overlay
        .route("/api/hidden-devices", get(hidden_devices))
        .route("/api/hide-device", post(hide_device))
        .route("/api/unhide-device", post(unhide_device))
        // Administrative reset
        .route("/reset-data", delete(reset_data))
        // WebSocket live feed
        .route("/api/ws", get(websocket_handler))
        .with_state(state)
}

// ========================================
// Ingestion Handler
// ========================================

/// Accept one sensor reading.
///
/// Devices get a bare status code: 200 once the reading is stored,
/// 500 otherwise. Broadcast happens after the response is decided and
/// cannot change it.
async fn ingest_reading(
    State(state): State<AppState>,
    Json(payload): Json<SensorPayload>,
) -> StatusCode {
    match state.ingest.ingest(payload).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Failed to ingest reading");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ========================================
// Query Handlers
// ========================================

async fn latest_data(State(state): State<AppState>) -> Result<Json<HashMap<String, Reading>>> {
    let latest = state.readings.latest_per_device().await?;
    Ok(Json(latest))
}

/// Query parameters for historical data
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoricalQuery {
    device_id: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn historical_data(
    State(state): State<AppState>,
    Query(query): Query<HistoricalQuery>,
) -> Result<Json<Vec<Reading>>> {
    let filter = RangeFilter {
        device_id: query.device_id,
        start: parse_bound(query.start_date.as_deref(), "startDate")?,
        end: parse_bound(query.end_date.as_deref(), "endDate")?,
    };

    let readings = state.readings.query_range(&filter).await?;
    Ok(Json(readings))
}

fn parse_bound(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| Error::Validation(format!("{field} is not a valid RFC 3339 datetime"))),
    }
}

/// Query parameters for the device list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceListQuery {
    /// Return plain device ids instead of summaries
    ids_only: Option<bool>,
}

async fn device_list(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> Result<Response> {
    if query.ids_only.unwrap_or(false) {
        let ids = state.directory.list_device_ids().await?;
        return Ok(Json(ids).into_response());
    }

    let summaries = state.directory.list_summaries().await?;
    Ok(Json(summaries).into_response())
}

// ========================================
// Visibility Handlers
// ========================================

/// Body naming a single device
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRef {
    device_id: String,
}

async fn hidden_devices(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let hidden = state.visibility.list_hidden().await?;
    Ok(Json(hidden))
}

async fn hide_device(
    State(state): State<AppState>,
    Json(body): Json<DeviceRef>,
) -> Result<Json<serde_json::Value>> {
    state.visibility.hide(&body.device_id).await?;
    Ok(Json(json!({"ok": true})))
}

async fn unhide_device(
    State(state): State<AppState>,
    Json(body): Json<DeviceRef>,
) -> Result<Json<serde_json::Value>> {
    state.visibility.unhide(&body.device_id).await?;
    Ok(Json(json!({"ok": true})))
}

// ========================================
// Reset Handler
// ========================================

/// Delete every stored reading. Destructive, test/demo use only.
async fn reset_data(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.readings.clear().await?;
    tracing::warn!("Reading store cleared via reset");
    Ok(Json(json!({"ok": true})))
}

// ========================================
// WebSocket Handler
// ========================================

/// Inbound feed events submitted by a subscriber
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "kebab-case")]
enum InboundFeedEvent {
    NewData(SensorPayload),
}

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
///
/// The channel is symmetric: subscribers receive every published
/// reading, and may push `new-data` events of their own. Inbound events
/// run through the ingestion pipeline, so what gets republished (to the
/// sender too) is the normalized stored reading, not the raw frame.
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = state.feed.register().await;

    // Forward published readings to this subscriber
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Handle frames pushed by the subscriber
    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    handle_inbound_frame(&recv_state, &conn_id, &text).await;
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(subscriber_id = %conn_id, "WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(subscriber_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
        conn_id
    });

    // Wait for either task to complete
    let conn_id = tokio::select! {
        _ = send_task => conn_id,
        result = recv_task => result.unwrap_or(conn_id),
    };

    state.feed.unregister(&conn_id).await;
}

/// Run one inbound frame through the ingestion pipeline.
///
/// Failures never tear down the connection; the sender gets an error
/// event and the diagnostic is logged.
async fn handle_inbound_frame(state: &AppState, conn_id: &uuid::Uuid, text: &str) {
    let event: InboundFeedEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(subscriber_id = %conn_id, error = %e, "Unparseable feed frame");
            state
                .feed
                .send_to(
                    conn_id,
                    FeedMessage::Error(FeedError {
                        message: "malformed event".to_string(),
                    }),
                )
                .await;
            return;
        }
    };

    match event {
        InboundFeedEvent::NewData(payload) => {
            if let Err(e) = state.ingest.ingest(payload).await {
                tracing::error!(subscriber_id = %conn_id, error = %e, "Failed to ingest feed reading");
                state
                    .feed
                    .send_to(
                        conn_id,
                        FeedMessage::Error(FeedError {
                            message: "ingestion failed".to_string(),
                        }),
                    )
                    .await;
            }
        }
    }
}
