//! Thin client for a remote clothing-size predictor, plus the session
//! state and HTTP front that drive it.

pub mod api;
pub mod config;
pub mod logging;
pub mod models;
pub mod predictor;
pub mod render;
pub mod session;

use axum::Router;
use std::sync::Arc;

pub use config::AppConfig;
pub use models::{
    FormPatch, InputEcho, MeasurementForm, MeasurementInput, PredictionResult, SizeLabel,
};
pub use predictor::{PredictorClient, RequestError};
pub use session::{Phase, Session, SessionError, SessionView, SharedSession};

#[derive(Debug, Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub predictor: PredictorClient,
}

impl AppState {
    pub fn new(predictor: PredictorClient) -> Arc<Self> {
        Arc::new(Self {
            session: SharedSession::new(),
            predictor,
        })
    }
}

pub fn app_state_from_config(config: &AppConfig) -> Result<Arc<AppState>, RequestError> {
    let predictor =
        PredictorClient::new(config.predictor_url.clone())?.with_timeout(config.timeout());
    Ok(AppState::new(predictor))
}

pub fn build_app(state: Arc<AppState>) -> Router {
    api::router(state)
}

pub async fn run_server(app: Router, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening for requests");
    axum::serve(listener, app).await?;
    Ok(())
}
