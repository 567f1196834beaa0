//! # FEEDS Telemetry
//!
//! Process-level plumbing shared by every FEEDS binary: configuration read
//! from the environment and the global `tracing` subscriber.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feeds_telemetry::{init_logging, FeedsConfig, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     let config = FeedsConfig::from_env()?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FEEDS_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `FEEDS_JSON_LOGS` | `false` | JSON log lines |
//! | `FEEDS_SERVICE_NAME` | `feeds` | Service name in logs |
//! | `FEEDS_TOPICS_ROOT` | `topics` | Bus root directory |
//! | `FEEDS_PRODUCER` | `feeds-ingest` | Producer stamped on envelopes |
//! | `FEEDS_CLASSIFICATION` | `LEVEL_0` | Classification stamped on envelopes |
//! | `FEEDS_BATCH_SIZE` | `10` | Envelopes per poll pass |
//! | `FEEDS_POLL_INTERVAL_MS` | `500` | Worker poll interval |
//! | `FEEDS_TRIAGE_STORE` | `triage/store.json` | Triage store document |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;

pub use config::{FeedsConfig, TelemetryConfig};
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry and configuration errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
