pub mod health;
pub mod history;
pub mod location;
pub mod preferences;
pub mod session;

use axum::Router;

use crate::state::AppState;

pub fn api() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(session::router())
        .merge(location::router())
        .merge(history::router())
        .merge(preferences::router())
}
