use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Installs the global fmt subscriber. Later calls are no-ops.
pub fn init_logging(filter: &str) -> anyhow::Result<()> {
    if LOGGING_INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;
    LOGGING_INIT.set(()).ok();

    tracing::info!(filter, "logging initialized");
    Ok(())
}
