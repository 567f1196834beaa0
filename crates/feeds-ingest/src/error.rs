//! Error types for packet ingest.
//!
//! Ingest never returns `Err`: every failure is collected into the
//! [`IngestReport`](crate::IngestReport) so that a packet with several
//! problems reports all of them at once.

use feeds_types::FeedTopic;
use std::path::PathBuf;
use thiserror::Error;

/// One reason a packet was not ingested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("manifest.json not found in {}", .packet_dir.display())]
    ManifestMissing { packet_dir: PathBuf },

    #[error("Unreadable manifest: {reason}")]
    ManifestInvalid { reason: String },

    #[error("No extractor for topic: {topic}")]
    UnknownTopic { topic: String },

    #[error("Missing artifact: {file}")]
    MissingArtifact { file: String },

    #[error("Artifact path escapes packet directory: {file}")]
    PathEscape { file: String },

    #[error("Unreadable artifact {file}: {reason}")]
    UnreadableArtifact { file: String, reason: String },

    #[error("Hash mismatch for {file}: expected={expected}, actual={actual}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Schema validation failed for {topic}: {reason}")]
    InvalidEnvelope { topic: FeedTopic, reason: String },

    #[error("No artifacts extracted from packet")]
    NoArtifacts,

    #[error("Inbox does not exist for topic {topic}")]
    MissingInbox { topic: FeedTopic },

    #[error("Staging failed: {reason}")]
    Staging { reason: String },

    #[error("Staging commit failed: {reason}")]
    Commit { reason: String },
}

impl IngestError {
    /// Whether a drift signal is emitted for this failure.
    ///
    /// A packet without a readable manifest has no identity to attach a
    /// drift signal to.
    #[must_use]
    pub fn emits_drift(&self) -> bool {
        !matches!(
            self,
            IngestError::ManifestMissing { .. } | IngestError::ManifestInvalid { .. }
        )
    }
}
