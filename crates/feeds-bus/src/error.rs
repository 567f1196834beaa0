//! Error types for the bus.

use feeds_types::{FeedTopic, ValidationError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Bus errors.
///
/// Handler failures are not errors here: they are captured by the
/// subscriber and routed to the dead-letter queue.
#[derive(Debug, Error)]
pub enum BusError {
    /// Envelope failed validation; nothing was written.
    #[error("Envelope {event_id} rejected: {}", summarize(.errors))]
    InvalidEnvelope {
        event_id: String,
        errors: Vec<ValidationError>,
    },

    /// Envelope was published to a topic other than its own.
    #[error("Envelope topic {actual} does not match target topic {expected}")]
    TopicMismatch {
        expected: FeedTopic,
        actual: FeedTopic,
    },

    /// An envelope with this id is already waiting in the inbox.
    #[error("Duplicate event {event_id}: {} already exists", .path.display())]
    DuplicateEvent { event_id: String, path: PathBuf },

    /// The id cannot name an envelope file.
    #[error("Invalid event id {0:?}")]
    InvalidEventId(String),

    /// The topic layout has not been initialized.
    #[error("Inbox does not exist: {}", .0.display())]
    MissingInbox(PathBuf),

    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// On-disk record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The blocking worker task died.
    #[error("Worker task failed: {reason}")]
    Worker { reason: String },
}

impl BusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BusError::Io {
            path: path.into(),
            source,
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
