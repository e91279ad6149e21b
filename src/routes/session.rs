use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::pipeline::metrics::LiveSummary;
use crate::state::AppState;
use crate::tracker::{StartOutcome, StopOutcome};
use crate::types::workout::WorkoutSession;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(current))
        .route("/api/session/start", post(start))
        .route("/api/session/stop", post(stop))
}

#[derive(Serialize, Deserialize)]
struct StartResponse {
    started: bool,
    session: Option<WorkoutSession>,
    warning: Option<String>,
}

async fn start(State(state): State<AppState>) -> Json<StartResponse> {
    let response = match state.tracker.start().await {
        StartOutcome::Started { session } => StartResponse {
            started: true,
            session: Some(session),
            warning: None,
        },
        StartOutcome::AlreadyActive { session } => StartResponse {
            started: false,
            session: Some(session),
            warning: None,
        },
        StartOutcome::Aborted { warning } => StartResponse {
            started: false,
            session: None,
            warning: Some(warning),
        },
    };
    Json(response)
}

#[derive(Deserialize)]
struct StopRequest {
    #[serde(default = "default_true")]
    save: bool,
}

fn default_true() -> bool {
    true
}

async fn stop(State(state): State<AppState>, body: Option<Json<StopRequest>>) -> Json<StopOutcome> {
    let save = body.map(|Json(req)| req.save).unwrap_or(true);
    Json(state.tracker.stop(save).await)
}

#[derive(Serialize)]
struct CurrentResponse {
    active: bool,
    session: Option<WorkoutSession>,
    live: Option<LiveSummary>,
}

async fn current(State(state): State<AppState>) -> Json<CurrentResponse> {
    let session = state.tracker.current_session().await;
    let live = state.tracker.live_summary().await;
    Json(CurrentResponse {
        active: session.is_some(),
        session,
        live,
    })
}
