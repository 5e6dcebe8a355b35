//! End-to-end API tests against the router with in-memory storage

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sensor_hub::device_directory::DeviceDirectory;
use sensor_hub::ingest::IngestPipeline;
use sensor_hub::live_feed::LiveFeed;
use sensor_hub::reading_store::ReadingStore;
use sensor_hub::state::{AppConfig, AppState};
use sensor_hub::visibility_overlay::VisibilityOverlay;
use sensor_hub::web_api;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_app() -> Router {
    let op_timeout = Duration::from_secs(5);
    let readings = ReadingStore::in_memory(op_timeout);
    let visibility = VisibilityOverlay::in_memory(op_timeout);
    let feed = Arc::new(LiveFeed::default());
    let ingest = Arc::new(IngestPipeline::new(readings.clone(), feed.clone()));
    let directory = DeviceDirectory::new(readings.clone());

    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        storage_timeout_sec: 5,
        feed_queue_capacity: 16,
    };

    web_api::create_router(AppState {
        config,
        readings,
        visibility,
        directory,
        ingest,
        feed,
    })
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_ingest_then_latest_data_round_trip() {
    let app = test_app();

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/sensor-data",
        Some(json!({
            "deviceId": "dev1",
            "temperature": "23.5",
            "humidity": "40",
            "timestamp": "2024-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&app, "GET", "/api/latest-data", None).await;
    assert_eq!(status, StatusCode::OK);

    let reading = &body["dev1"];
    assert_eq!(reading["deviceName"], "Unknown device");
    assert_eq!(reading["temperature"].as_f64(), Some(23.5));
    assert_eq!(reading["humidity"].as_f64(), Some(40.0));
    assert_eq!(reading["timestamp"], "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_latest_data_keeps_newest_reading_per_device() {
    let app = test_app();

    for (temp, ts) in [("20", "2024-01-01T00:00:00Z"), ("25", "2024-01-02T00:00:00Z")] {
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/sensor-data",
            Some(json!({"deviceId": "dev1", "temperature": temp, "humidity": "50", "timestamp": ts})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send_json(&app, "GET", "/api/latest-data", None).await;
    assert_eq!(body["dev1"]["temperature"].as_f64(), Some(25.0));
}

#[tokio::test]
async fn test_non_numeric_values_are_stored_not_rejected() {
    let app = test_app();

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/sensor-data",
        Some(json!({"deviceId": "dev1", "temperature": "warm", "humidity": "40"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&app, "GET", "/api/latest-data", None).await;
    // NaN serializes as JSON null
    assert_eq!(body["dev1"]["temperature"], Value::Null);
    assert_eq!(body["dev1"]["humidity"].as_f64(), Some(40.0));
}

#[tokio::test]
async fn test_historical_data_range_is_inclusive() {
    let app = test_app();

    for ts in [
        "2024-01-01T00:00:00Z",
        "2024-01-02T00:00:00Z",
        "2024-01-03T00:00:00Z",
        "2024-01-04T00:00:00Z",
    ] {
        send_json(
            &app,
            "POST",
            "/api/sensor-data",
            Some(json!({"deviceId": "dev1", "temperature": "20", "humidity": "50", "timestamp": ts})),
        )
        .await;
    }

    let (status, body) = send_json(
        &app,
        "GET",
        "/api/historical-data?deviceId=dev1&startDate=2024-01-02T00:00:00Z&endDate=2024-01-03T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["timestamp"], "2024-01-02T00:00:00Z");
    assert_eq!(rows[1]["timestamp"], "2024-01-03T00:00:00Z");
}

#[tokio::test]
async fn test_historical_data_rejects_bad_dates() {
    let app = test_app();

    let (status, body) = send_json(
        &app,
        "GET",
        "/api/historical-data?startDate=yesterday",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_device_list_summaries_and_ids() {
    let app = test_app();

    send_json(
        &app,
        "POST",
        "/api/sensor-data",
        Some(json!({"deviceId": "z9", "deviceName": "Attic", "temperature": "20", "humidity": "50"})),
    )
    .await;
    send_json(
        &app,
        "POST",
        "/api/sensor-data",
        Some(json!({"deviceId": "a1", "deviceName": "Cellar", "temperature": "20", "humidity": "50"})),
    )
    .await;

    let (status, body) = send_json(&app, "GET", "/api/device-list", None).await;
    assert_eq!(status, StatusCode::OK);
    let summaries = body.as_array().unwrap();
    assert_eq!(summaries[0]["deviceName"], "Attic");
    assert_eq!(summaries[1]["deviceName"], "Cellar");

    let (_, body) = send_json(&app, "GET", "/api/device-list?idsOnly=true", None).await;
    assert_eq!(body, json!(["a1", "z9"]));
}

#[tokio::test]
async fn test_hide_unhide_flow_is_idempotent() {
    let app = test_app();

    for _ in 0..2 {
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/hide-device",
            Some(json!({"deviceId": "dev1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    let (_, body) = send_json(&app, "GET", "/api/hidden-devices", None).await;
    assert_eq!(body, json!(["dev1"]));

    // Unhiding a never-hidden device succeeds too
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/unhide-device",
        Some(json!({"deviceId": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/unhide-device",
        Some(json!({"deviceId": "dev1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&app, "GET", "/api/hidden-devices", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_hide_blank_device_id_rejected() {
    let app = test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/hide-device",
        Some(json!({"deviceId": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_reset_clears_readings() {
    let app = test_app();

    send_json(
        &app,
        "POST",
        "/api/sensor-data",
        Some(json!({"deviceId": "dev1", "temperature": "20", "humidity": "50"})),
    )
    .await;

    let (status, body) = send_json(&app, "DELETE", "/reset-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (_, body) = send_json(&app, "GET", "/api/latest-data", None).await;
    assert_eq!(body, json!({}));

    let (_, body) = send_json(&app, "GET", "/api/device-list", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_healthz_reports_memory_backend() {
    let app = test_app();

    let (status, body) = send_json(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}
