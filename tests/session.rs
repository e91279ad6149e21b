use std::sync::Arc;
use std::time::Duration;

use axum::{body::to_bytes, http::Request, http::StatusCode, Router};
use serde_json::{json, Value};
use tower::ServiceExt;
use workout_tracker::{
    config::Config,
    routes,
    state::AppState,
    store::MemoryStore,
    tracker::ManualClock,
};

fn test_state() -> (AppState, ManualClock) {
    let mut config = Config::from_env();
    config.data_dir = None;
    config.location_auto_grant = true;
    config.require_initial_fix = false;
    let clock = ManualClock::new(1_700_000_000_000);
    let state = AppState::with_parts(config, Arc::new(MemoryStore::new()), Arc::new(clock.clone()));
    (state, clock)
}

fn app(state: AppState) -> Router {
    routes::api().with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(json.to_string())
        }
        None => axum::body::Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn fix_json(lat: f64, lon: f64, timestamp: i64, speed: Option<f64>) -> Value {
    json!({
        "latitude": lat,
        "longitude": lon,
        "altitude": null,
        "timestamp": timestamp,
        "speed": speed,
        "accuracy": 5.0
    })
}

async fn wait_for_points(app: &Router, count: usize) {
    for _ in 0..200 {
        let (_, body) = send(app, "GET", "/api/session", None).await;
        let len = body["session"]["route"].as_array().map_or(0, Vec::len);
        if len >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never reached {count} points");
}

#[tokio::test]
async fn full_workout_round_trip() {
    let (state, clock) = test_state();
    let app = app(state);

    let (status, body) = send(&app, "POST", "/api/session/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);
    let id = body["session"]["id"].as_str().expect("id").to_string();
    assert_eq!(body["session"]["status"], "ongoing");

    let (_, body) = send(&app, "POST", "/api/session/start", None).await;
    assert_eq!(body["started"], false);
    assert_eq!(body["session"]["id"], id.as_str());

    clock.advance(10_000);
    let (status, body) = send(
        &app,
        "POST",
        "/api/fixes",
        Some(fix_json(52.52, 13.405, 1_700_000_010_000, Some(5.0))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking"], true);

    clock.advance(10_000);
    send(
        &app,
        "POST",
        "/api/fixes",
        Some(fix_json(52.5205, 13.406, 1_700_000_020_000, None)),
    )
    .await;
    wait_for_points(&app, 2).await;

    let (_, body) = send(&app, "GET", "/api/session", None).await;
    assert_eq!(body["active"], true);
    assert!(body["live"]["distance_km"].as_f64().expect("distance") > 0.0);

    let (status, body) = send(&app, "POST", "/api/session/stop", Some(json!({ "save": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["session"]["duration"], 20);
    assert_eq!(body["session"]["maxSpeed"], 5.0);
    assert_eq!(body["session"]["route"].as_array().map(Vec::len), Some(2));

    let (_, body) = send(&app, "GET", "/api/sessions", None).await;
    let list = body.as_array().expect("list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["duration_label"], "00:00:20");
    assert_eq!(list[0]["points"], 2);

    let (status, body) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (_, body) = send(&app, "GET", "/api/session", None).await;
    assert_eq!(body["active"], false);
    assert!(body["session"].is_null());
}

#[tokio::test]
async fn accepted_fix_is_saved_even_when_stop_follows_at_once() {
    let (state, clock) = test_state();
    let app = app(state);

    send(&app, "POST", "/api/session/start", None).await;
    clock.advance(1_000);
    let (_, body) = send(
        &app,
        "POST",
        "/api/fixes",
        Some(fix_json(52.52, 13.405, 1_700_000_001_000, Some(7.0))),
    )
    .await;
    assert_eq!(body["tracking"], true);

    let (_, body) = send(&app, "POST", "/api/session/stop", None).await;
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["session"]["route"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["session"]["maxSpeed"], 7.0);
}

#[tokio::test]
async fn discard_does_not_add_history() {
    let (state, clock) = test_state();
    let app = app(state);

    send(&app, "POST", "/api/session/start", None).await;
    clock.advance(5_000);
    let (_, body) = send(&app, "POST", "/api/session/stop", Some(json!({ "save": false }))).await;
    assert_eq!(body["outcome"], "discarded");
    assert_eq!(body["session"]["status"], "discarded");

    let (_, body) = send(&app, "GET", "/api/sessions", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn stop_without_session_reports_not_active() {
    let (state, _) = test_state();
    let app = app(state);
    let (status, body) = send(&app, "POST", "/api/session/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "not_active");
}

#[tokio::test]
async fn denied_permission_returns_warning() {
    let (state, _) = test_state();
    let app = app(state);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/location/permissions",
        Some(json!({ "foreground": "denied" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foreground"], "denied");

    let (status, body) = send(&app, "POST", "/api/session/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], false);
    assert!(body["session"].is_null());
    assert!(body["warning"].as_str().expect("warning").contains("permission"));
}

#[tokio::test]
async fn invalid_fix_is_rejected() {
    let (state, _) = test_state();
    let app = app(state);
    let (status, body) = send(&app, "POST", "/api/fixes", Some(fix_json(91.0, 0.0, 0, None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("Latitude"));
}

#[tokio::test]
async fn fix_while_idle_updates_current_location_only() {
    let (state, _) = test_state();
    let app = app(state);
    let (_, body) = send(&app, "POST", "/api/fixes", Some(fix_json(1.0, 2.0, 0, Some(1.5)))).await;
    assert_eq!(body["tracking"], false);

    let (_, body) = send(&app, "GET", "/api/location", None).await;
    assert_eq!(body["current"]["latitude"], 1.0);
    assert_eq!(body["tracking"], false);
    assert_eq!(body["history_len"], 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (state, _) = test_state();
    let app = app(state);
    let (status, _) = send(&app, "GET", "/api/sessions/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preferences_default_and_update() {
    let (state, _) = test_state();
    let app = app(state);

    let (_, body) = send(&app, "GET", "/api/preferences", None).await;
    assert_eq!(body, json!({ "units": "km", "mapStyle": "street" }));

    let (status, body) = send(
        &app,
        "PUT",
        "/api/preferences",
        Some(json!({ "units": "mi", "mapStyle": "satellite" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["units"], "mi");

    let (_, body) = send(&app, "GET", "/api/preferences", None).await;
    assert_eq!(body, json!({ "units": "mi", "mapStyle": "satellite" }));
}
