use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs the JSON tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
///
/// # Errors
/// Fails when another global subscriber is already installed.
pub fn init() -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false).json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;
        info!(service = "logeasy", version = env!("CARGO_PKG_VERSION"), "tracing initialized");

        Ok::<(), Error>(())
    })?;
    Ok(())
}

/// Plain-text subscriber for the command-line tools.
///
/// # Errors
/// Fails when another global subscriber is already installed.
pub fn init_cli() -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .try_init()
            .map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;
        Ok::<(), Error>(())
    })?;
    Ok(())
}
