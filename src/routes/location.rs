use axum::{extract::State, routing::get, routing::post, routing::put, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::feed::{LocationFeed, PermissionStatus, Permissions};
use crate::state::AppState;
use crate::types::workout::LocationFix;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/fixes", post(push_fix))
        .route("/api/location", get(location))
        .route("/api/location/permissions", put(update_permissions))
}

#[derive(Serialize, Deserialize)]
struct PushFixResponse {
    tracking: bool,
}

fn validate_fix(fix: &LocationFix) -> Result<(), AppError> {
    if !fix.latitude.is_finite() || !(-90.0..=90.0).contains(&fix.latitude) {
        return Err(AppError::BadRequest(format!(
            "Latitude out of range: {}",
            fix.latitude
        )));
    }
    if !fix.longitude.is_finite() || !(-180.0..=180.0).contains(&fix.longitude) {
        return Err(AppError::BadRequest(format!(
            "Longitude out of range: {}",
            fix.longitude
        )));
    }
    if let Some(speed) = fix.speed {
        if !speed.is_finite() {
            return Err(AppError::BadRequest("Speed must be a finite number".to_string()));
        }
    }
    Ok(())
}

async fn push_fix(
    State(state): State<AppState>,
    Json(fix): Json<LocationFix>,
) -> Result<Json<PushFixResponse>, AppError> {
    validate_fix(&fix)?;
    let tracking = state.feed.publish(fix);
    Ok(Json(PushFixResponse { tracking }))
}

#[derive(Serialize)]
struct LocationResponse {
    current: Option<LocationFix>,
    permissions: Permissions,
    tracking: bool,
    history_len: usize,
}

async fn location(State(state): State<AppState>) -> Json<LocationResponse> {
    Json(LocationResponse {
        current: state.feed.current_fix(),
        permissions: state.feed.permissions(),
        tracking: state.feed.is_tracking(),
        history_len: state.feed.history().len(),
    })
}

#[derive(Deserialize)]
struct PermissionsUpdate {
    foreground: Option<PermissionStatus>,
    background: Option<PermissionStatus>,
}

async fn update_permissions(
    State(state): State<AppState>,
    Json(update): Json<PermissionsUpdate>,
) -> Json<Permissions> {
    let mut permissions = state.feed.permissions();
    if let Some(foreground) = update.foreground {
        permissions.foreground = foreground;
    }
    if let Some(background) = update.background {
        permissions.background = background;
    }
    state.feed.set_permissions(permissions);
    tracing::info!(
        "Location permissions set: foreground={:?}, background={:?}",
        permissions.foreground,
        permissions.background
    );
    Json(permissions)
}
