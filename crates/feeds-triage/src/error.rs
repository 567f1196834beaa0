//! Error types for drift triage.

use crate::state::TriageState;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for triage operations.
pub type TriageResult<T> = Result<T, TriageError>;

/// Triage errors.
#[derive(Debug, Error)]
pub enum TriageError {
    /// No entry exists for the drift id.
    #[error("Drift ID not found: {drift_id}")]
    NotFound { drift_id: String },

    /// The requested state is not the current state's successor.
    #[error("Invalid transition: {from} -> {to}. Allowed: {}", allowed(.from))]
    InvalidTransition { from: TriageState, to: TriageState },

    /// A state name outside the lifecycle.
    #[error("Unknown triage state: {0}")]
    UnknownState(String),

    /// The drift record cannot be triaged.
    #[error("Invalid drift record: {reason}")]
    InvalidDrift { reason: String },

    /// Store file or lock could not be accessed.
    #[error("Triage store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Store document on disk could not be decoded.
    #[error("Triage store is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Store document could not be encoded for saving; the file is untouched.
    #[error("Triage store could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TriageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TriageError::Io {
            path: path.into(),
            source,
        }
    }
}

fn allowed(from: &TriageState) -> String {
    match from.next() {
        Some(next) => format!("[{next}]"),
        None => "[]".to_string(),
    }
}
