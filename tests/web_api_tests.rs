//! Integration tests for the MorseVibe service API.
//!
//! These tests require the `web` feature to be enabled:
//! ```bash
//! cargo test --features web web_api
//! ```

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use morsevibe::config::{Config, OverlapPolicy};
use morsevibe::playback::device::MockVibrator;
use morsevibe::web::{create_router, AppState};

mod fixtures;
use fixtures::fast_playback;

/// Creates a test AppState driving a mock device with fast timings.
fn create_test_state(overlap: OverlapPolicy) -> (AppState, Arc<MockVibrator>) {
    let mut config = Config::default();
    config.playback = fast_playback();
    config.playback.overlap = overlap;

    let device = Arc::new(MockVibrator::new());
    let state = AppState::with_device(config, device.clone());
    (state, device)
}

fn create_test_app() -> (Router, AppState, Arc<MockVibrator>) {
    let (state, device) = create_test_state(OverlapPolicy::Reject);
    (create_router(state.clone()), state, device)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Health / Encode / Config
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = create_test_app();
    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["device"], "mock");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_encode_endpoint() {
    let (app, _, device) = create_test_app();
    let (status, json) = send(&app, post_json("/api/encode", &json!({ "text": "sos" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["input"], "sos");
    assert_eq!(json["morse"], "... --- ...");
    assert_eq!(json["pulses"], 9);
    // Encoding never touches the device
    assert!(device.pulses().is_empty());
}

#[tokio::test]
async fn test_config_endpoint() {
    let (app, _, _) = create_test_app();
    let (status, json) = send(&app, get("/api/config")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["playback"]["dot_length_ms"], 2);
    assert_eq!(json["playback"]["overlap"], "reject");
    assert_eq!(json["device"], "mock");
}

// ============================================================================
// Playback
// ============================================================================

#[tokio::test]
async fn test_start_playback_and_wait() {
    let (app, state, device) = create_test_app();
    let (status, json) = send(
        &app,
        post_json("/api/playback", &json!({ "text": "sos", "speed": 0.5 })),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = json["job"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["job"]["morse"], "... --- ...");
    assert_eq!(json["job"]["total_pulses"], 9);

    let done = state.playback().wait(&job_id).await.unwrap();
    assert_eq!(done.pulses_played, 9);
    assert_eq!(device.pulses().len(), 9);

    let (status, json) = send(&app, get(&format!("/api/playback/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["job"]["status"], "completed");
}

#[tokio::test]
async fn test_start_playback_empty_text() {
    let (app, _, device) = create_test_app();
    let (status, json) = send(&app, post_json("/api/playback", &json!({ "text": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Please enter some text");
    assert!(device.pulses().is_empty());
}

#[tokio::test]
async fn test_start_playback_nothing_to_play() {
    let (app, _, _) = create_test_app();
    let (status, json) = send(&app, post_json("/api/playback", &json!({ "text": "?!" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Nothing to play"));
}

#[tokio::test]
async fn test_start_playback_invalid_speed() {
    let (app, _, _) = create_test_app();
    let (status, json) = send(
        &app,
        post_json("/api/playback", &json!({ "text": "e", "speed": -0.5 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid speed"));
}

#[tokio::test(start_paused = true)]
async fn test_start_playback_while_busy_conflicts() {
    let (app, _, _) = create_test_app();
    let (status, first) = send(&app, post_json("/api/playback", &json!({ "text": "paris" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, json) = send(&app, post_json("/api/playback", &json!({ "text": "e" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["details"], first["job"]["id"]);
}

#[tokio::test(start_paused = true)]
async fn test_preempt_policy_replaces_running_playback() {
    let (state, _) = create_test_state(OverlapPolicy::Preempt);
    let app = create_router(state.clone());

    let (_, first) = send(&app, post_json("/api/playback", &json!({ "text": "paris" }))).await;
    let (status, second) = send(&app, post_json("/api/playback", &json!({ "text": "e" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let first_id = first["job"]["id"].as_str().unwrap();
    let second_id = second["job"]["id"].as_str().unwrap();

    let (_, json) = send(&app, get(&format!("/api/playback/{first_id}"))).await;
    assert_eq!(json["job"]["status"], "cancelled");

    state.playback().wait(second_id).await.unwrap();
    let (_, json) = send(&app, get(&format!("/api/playback/{second_id}"))).await;
    assert_eq!(json["job"]["status"], "completed");
}

#[tokio::test(start_paused = true)]
async fn test_list_and_cancel_playback() {
    let (app, state, _) = create_test_app();
    let (_, started) = send(&app, post_json("/api/playback", &json!({ "text": "paris" }))).await;
    let job_id = started["job"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, get("/api/playback")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current"]["id"], job_id.as_str());
    assert_eq!(json["jobs"].as_array().unwrap().len(), 1);

    let (status, json) = send(&app, delete(&format!("/api/playback/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let done = state.playback().wait(&job_id).await.unwrap();
    assert_eq!(done.status.to_string(), "cancelled");

    let (_, json) = send(&app, get("/api/playback")).await;
    assert!(json["current"].is_null());

    // Cancelling a finished job is a no-op
    let (status, json) = send(&app, delete(&format!("/api/playback/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_unknown_playback_is_404() {
    let (app, _, _) = create_test_app();

    let (status, json) = send(&app, get("/api/playback/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("does-not-exist"));

    let (status, _) = send(&app, delete("/api/playback/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
