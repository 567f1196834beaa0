//! Configuration from environment variables.
//!
//! Both configs read through a lookup function so tests can supply their own
//! environment; `from_env` binds it to the process environment.

use crate::TelemetryError;
use feeds_bus::{WorkerConfig, DEFAULT_BATCH_SIZE};
use feeds_types::Classification;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SERVICE_NAME: &str = "feeds";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TOPICS_ROOT: &str = "topics";
const DEFAULT_PRODUCER: &str = "feeds-ingest";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_TRIAGE_STORE: &str = "triage/store.json";

// =============================================================================
// LOGGING
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// `EnvFilter` directive (e.g. `info`, `feeds_bus=debug,info`).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FEEDS_SERVICE_NAME`: service name (default: feeds)
    /// - `FEEDS_LOG_LEVEL` or `RUST_LOG`: filter directive (default: info)
    /// - `FEEDS_JSON_LOGS`: `true`/`1` for JSON output (default: false)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: lookup("FEEDS_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("FEEDS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("FEEDS_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }
}

// =============================================================================
// BUS, INGEST AND TRIAGE
// =============================================================================

/// Runtime configuration shared by FEEDS producers and consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedsConfig {
    /// Root holding one directory per topic.
    pub topics_root: PathBuf,

    /// Producer name stamped on ingested envelopes.
    pub producer: String,

    /// Classification stamped on ingested envelopes.
    pub classification: Classification,

    /// Envelopes claimed per subscriber pass.
    pub batch_size: usize,

    /// Pause between worker passes that found less than a full batch.
    pub poll_interval: Duration,

    /// Triage store document.
    pub triage_store: PathBuf,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            topics_root: PathBuf::from(DEFAULT_TOPICS_ROOT),
            producer: DEFAULT_PRODUCER.to_string(),
            classification: Classification::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            triage_store: PathBuf::from(DEFAULT_TRIAGE_STORE),
        }
    }
}

impl FeedsConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FEEDS_TOPICS_ROOT`: topics root (default: topics)
    /// - `FEEDS_PRODUCER`: producer name (default: feeds-ingest)
    /// - `FEEDS_CLASSIFICATION`: `LEVEL_0`..`LEVEL_3` (default: LEVEL_0)
    /// - `FEEDS_BATCH_SIZE`: envelopes per pass, at least 1 (default: 10)
    /// - `FEEDS_POLL_INTERVAL_MS`: worker poll interval (default: 500)
    /// - `FEEDS_TRIAGE_STORE`: triage store path (default: triage/store.json)
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Config`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, TelemetryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`FeedsConfig::from_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// See [`FeedsConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TelemetryError> {
        let defaults = Self::default();

        let classification = match lookup("FEEDS_CLASSIFICATION") {
            Some(raw) => raw
                .parse()
                .map_err(|_| config_error("FEEDS_CLASSIFICATION", &raw))?,
            None => defaults.classification,
        };
        let batch_size = match lookup("FEEDS_BATCH_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| config_error("FEEDS_BATCH_SIZE", &raw))?,
            None => defaults.batch_size,
        };
        let poll_interval = match lookup("FEEDS_POLL_INTERVAL_MS") {
            Some(raw) => raw
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| config_error("FEEDS_POLL_INTERVAL_MS", &raw))?,
            None => defaults.poll_interval,
        };

        Ok(Self {
            topics_root: lookup("FEEDS_TOPICS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.topics_root),
            producer: lookup("FEEDS_PRODUCER").unwrap_or(defaults.producer),
            classification,
            batch_size,
            poll_interval,
            triage_store: lookup("FEEDS_TRIAGE_STORE")
                .map(PathBuf::from)
                .unwrap_or(defaults.triage_store),
        })
    }

    /// Worker settings derived from this configuration.
    #[must_use]
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            batch_size: self.batch_size,
            poll_interval: self.poll_interval,
        }
    }
}

fn config_error(key: &str, value: &str) -> TelemetryError {
    TelemetryError::Config(format!("{key}={value:?} is not valid"))
}
