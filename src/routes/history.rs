use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::pipeline::format::{format_duration, format_number, format_pace};
use crate::state::AppState;
use crate::store::{self, USER_PREFERENCES_KEY};
use crate::types::preferences::{UserPreferences, Units};
use crate::types::workout::{SessionStatus, WorkoutSession};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    id: String,
    start_time: i64,
    end_time: Option<i64>,
    status: SessionStatus,
    duration: u64,
    duration_label: String,
    distance_m: f64,
    distance_label: String,
    avg_pace: f64,
    pace_label: String,
    avg_speed: f64,
    max_speed: f64,
    points: usize,
}

impl SessionSummary {
    fn new(session: &WorkoutSession, units: Units) -> Self {
        Self {
            id: session.id.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            status: session.status,
            duration: session.duration,
            duration_label: format_duration(session.duration),
            distance_m: session.distance,
            distance_label: format!(
                "{} {}",
                format_number(Some(units.from_meters(session.distance)), 2),
                units.label()
            ),
            avg_pace: session.avg_pace,
            pace_label: format_pace(session.avg_pace),
            avg_speed: session.avg_speed,
            max_speed: session.max_speed,
            points: session.route.len(),
        }
    }
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    let prefs: UserPreferences = store::load_json(state.store.as_ref(), USER_PREFERENCES_KEY)
        .await
        .unwrap_or_default();
    let sessions = state.tracker.past_sessions().await;
    Json(
        sessions
            .iter()
            .rev()
            .map(|session| SessionSummary::new(session, prefs.units))
            .collect(),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutSession>, AppError> {
    state
        .tracker
        .past_session(&id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound(id))
}
