use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::models::FormPatch;
use crate::session::{SessionError, SessionView};
use crate::AppState;

use super::models::ErrorResponse;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn session_error(err: SessionError) -> ApiError {
    let status = match err {
        SessionError::Busy => StatusCode::CONFLICT,
        SessionError::UnknownField(_) => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.session.lock().view())
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<FormPatch>,
) -> Json<SessionView> {
    let mut session = state.session.lock();
    session.apply_patch(patch);
    Json(session.view())
}

/// An empty body submits the stored form; anything else must be a valid
/// form patch.
fn parse_patch(body: &[u8]) -> Result<Option<FormPatch>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|err| {
        tracing::debug!(%err, "rejecting unreadable form body");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!("invalid form body: {err}"),
            }),
        )
    })
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SessionView>, ApiError> {
    let patch = parse_patch(&body)?;

    // Spawned so the prediction completes even if the caller goes away.
    let session = state.session.clone();
    let predictor = state.predictor.clone();
    let view = tokio::spawn(async move { session.submit_with(patch, &predictor).await })
        .await
        .map_err(|err| {
            tracing::error!(%err, "submission task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "submission task failed".to_string(),
                }),
            )
        })?
        .map_err(session_error)?;

    Ok(Json(view))
}

pub async fn display(State(state): State<Arc<AppState>>) -> Response {
    let text = state.session.lock().display();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
        .into_response()
}
