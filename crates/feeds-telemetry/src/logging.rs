//! Structured logging setup.
//!
//! JSON output carries consistent fields for log shippers:
//! - `timestamp`: RFC 3339
//! - `level`
//! - `target`: emitting crate and module
//! - `fields`: the event's structured fields (`topic`, `event_id`, ...)

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for `config`; `RUST_LOG` set in the environment wins.
///
/// # Errors
///
/// [`TelemetryError::Config`] if the directive does not parse.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(format!("log filter {:?}: {e}", config.log_level)))
}

/// Install the global `tracing` subscriber.
///
/// # Errors
///
/// - [`TelemetryError::Config`] for an unparseable filter
/// - [`TelemetryError::LoggerInit`] if a global subscriber is already set
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    let installed = if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(true),
            )
            .try_init()
    };
    installed.map_err(|e| TelemetryError::LoggerInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}
