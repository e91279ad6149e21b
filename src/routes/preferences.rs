use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{self, USER_PREFERENCES_KEY};
use crate::types::preferences::UserPreferences;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/preferences", get(get_preferences).put(put_preferences))
}

async fn get_preferences(State(state): State<AppState>) -> Json<UserPreferences> {
    let prefs = store::load_json(state.store.as_ref(), USER_PREFERENCES_KEY)
        .await
        .unwrap_or_default();
    Json(prefs)
}

async fn put_preferences(
    State(state): State<AppState>,
    Json(prefs): Json<UserPreferences>,
) -> Result<Json<UserPreferences>, AppError> {
    store::save_json(state.store.as_ref(), USER_PREFERENCES_KEY, &prefs).await?;
    tracing::info!("Preferences updated: units={}", prefs.units.label());
    Ok(Json(prefs))
}
