mod handlers;
mod models;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub use handlers::{display, get_session, not_found, submit, update_form};
pub use models::ErrorResponse;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/form", put(update_form))
        .route("/session/submit", post(submit))
        .route("/session/display", get(display))
        .fallback(not_found)
        .with_state(state)
}
