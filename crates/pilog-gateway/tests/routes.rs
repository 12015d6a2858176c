// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

// HTTP contract: readings found vs no results vs error

use chrono::{TimeZone, Utc};
use pilog::{
    AdapterOptions, DeviceIdentity, Poller, Reading, ReadingStore, SensorConfigEntry,
    SensorManifest, SensorType, SimulatedHardware, SqliteStore,
};
use pilog_gateway::{build_router, AppState};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn reading(second: u32, location: &str) -> Reading {
    Reading {
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, second).unwrap(),
        device_id: "abc".to_string(),
        device_name: "pi1".to_string(),
        location: location.to_string(),
        sensor_type: SensorType::Bme680,
        temperature: Some(21.5),
        humidity: Some(40.2),
        pressure: Some(1012.0),
        gas_resistance: None,
        adc_raw_value: None,
        adc_voltage: None,
    }
}

fn seeded_store() -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    store
        .insert_batch(&[reading(0, "kitchen"), reading(1, "hall"), reading(2, "attic")])
        .unwrap();
    store
}

/// Serve `state` on an ephemeral port and issue one GET.
async fn get(state: AppState, uri: &str) -> (StatusCode, Option<Value>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(Arc::new(state));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let response = reqwest::get(format!("http://{}{}", addr, uri)).await.unwrap();
    let status = response.status();
    let bytes = response.bytes().await.unwrap();
    let body = (!bytes.is_empty()).then(|| serde_json::from_slice(&bytes).unwrap());
    (status, body)
}

#[tokio::test]
async fn test_since_returns_strictly_newer() {
    let state = AppState::new(seeded_store());
    let (status, body) = get(state, "/readings/since/2024-06-01T12:00:01Z").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let readings = body.as_array().unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0]["location"], "attic");
}

#[tokio::test]
async fn test_legacy_route_alias() {
    let state = AppState::new(seeded_store());
    let (status, body) = get(state, "/get_recent/2024-06-01%2012:00:00").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_latest() {
    let (status, body) = get(AppState::new(seeded_store()), "/readings/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["location"], "attic");

    let (status, body) = get(AppState::new(seeded_store()), "/get_last").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["temperature"], 21.5);
}

#[tokio::test]
async fn test_empty_store_is_not_an_error() {
    let empty = || AppState::new(Arc::new(SqliteStore::in_memory().unwrap()));
    let expected = serde_json::json!({"message": "query returns no results"});

    let (status, body) = get(empty(), "/readings/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), expected);

    let (status, body) = get(empty(), "/readings/since/2024-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), expected);
}

#[tokio::test]
async fn test_bad_timestamp_is_400() {
    let (status, body) = get(AppState::new(seeded_store()), "/readings/since/last-tuesday").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body["code"], 400);
    assert!(body["error"].as_str().unwrap().contains("last-tuesday"));
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("locallogs.db");
    let store = Arc::new(SqliteStore::open(&db).unwrap());
    store.insert(&reading(0, "kitchen")).unwrap();

    rusqlite::Connection::open(&db)
        .unwrap()
        .execute_batch("DROP TABLE readings")
        .unwrap();

    let (status, body) = get(AppState::new(store), "/readings/latest").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = body.unwrap();
    assert_eq!(body, serde_json::json!({"error": "storage unavailable", "code": 500}));
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_poll_writes_and_returns_no_content() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let manifest: SensorManifest = [SensorConfigEntry {
        device_name: "pi1".to_string(),
        location: "kitchen".to_string(),
        sensor_type: SensorType::Dht22,
        channel: 4,
    }]
    .into_iter()
    .collect();
    let poller = Arc::new(Poller::new(
        manifest,
        Arc::new(SimulatedHardware::new()),
        &AdapterOptions {
            dht22_attempts: 1,
            dht22_retry_delay: Duration::ZERO,
        },
        DeviceIdentity::new("abc", "pi1"),
        Arc::clone(&store),
    ));

    let state = AppState::new(Arc::clone(&store)).with_poller(poller);
    let (status, body) = get(state, "/poll").await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_poll_without_poller_is_503() {
    let (status, _) = get(AppState::new(seeded_store()), "/poll_sensors").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(AppState::new(seeded_store()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["readings"], 3);
    assert_eq!(body["polling"], false);
}
