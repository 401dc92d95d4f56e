use anyhow::Context;
use size_recommender::{app_state_from_config, build_app, logging, run_server, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logging::init_logging(&config.log_filter)?;

    let state = app_state_from_config(&config).context("failed to build predictor client")?;
    tracing::info!(
        predictor_url = %state.predictor.predict_url(),
        timeout_ms = ?config.timeout_ms,
        "predictor client ready"
    );

    run_server(build_app(state), config.port).await
}
