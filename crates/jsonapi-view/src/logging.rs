use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "jsonapi_view=info";

/// Initialize logging for hosts that have no subscriber of their own
///
/// Logs go to stderr. The level can be controlled via the RUST_LOG
/// environment variable:
/// - RUST_LOG=jsonapi_view=debug  (schema bindings and render paths)
/// - RUST_LOG=jsonapi_view=info   (default level)
pub fn init() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!("jsonapi-view logging initialized");

    Ok(())
}
