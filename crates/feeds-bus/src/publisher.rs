//! # Publisher
//!
//! Validates an envelope and lands it in its topic's inbox atomically.
//!
//! ```text
//! validate ──▶ inbox/.tmp_<nonce> ──write+fsync──▶ rename ──▶ inbox/<eventId>.json
//! ```
//!
//! Consumers only match `*.json` names that do not start with a dot, so the
//! temp file is invisible until the rename makes the complete file appear.

use crate::adapters::StdFileSystem;
use crate::error::{BusError, BusResult};
use crate::layout::TopicLayout;
use crate::ports::FileSystemAdapter;
use crate::TEMP_PREFIX;
use feeds_types::{validate, Envelope, FeedTopic};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Writes validated envelopes into topic inboxes.
pub struct Publisher<FS: FileSystemAdapter = StdFileSystem> {
    layout: TopicLayout,
    fs: FS,
}

impl Publisher<StdFileSystem> {
    #[must_use]
    pub fn new(topics_root: impl Into<PathBuf>) -> Self {
        Self::with_fs(topics_root, StdFileSystem)
    }
}

impl<FS: FileSystemAdapter> Publisher<FS> {
    #[must_use]
    pub fn with_fs(topics_root: impl Into<PathBuf>, fs: FS) -> Self {
        Self {
            layout: TopicLayout::new(topics_root),
            fs,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &TopicLayout {
        &self.layout
    }

    /// Publish `envelope` to `topic`. Returns the final inbox path.
    ///
    /// # Errors
    ///
    /// - [`BusError::TopicMismatch`] if `envelope.topic != topic`
    /// - [`BusError::InvalidEnvelope`] if validation finds any error
    /// - [`BusError::MissingInbox`] if the layout was never initialized
    /// - [`BusError::DuplicateEvent`] if `<eventId>.json` is already in the inbox
    /// - [`BusError::Io`] / [`BusError::Serialization`] on write failure
    ///
    /// Nothing is visible in the inbox unless this returns `Ok`.
    pub fn publish(&self, topic: FeedTopic, envelope: &Envelope) -> BusResult<PathBuf> {
        if envelope.topic != topic {
            return Err(BusError::TopicMismatch {
                expected: topic,
                actual: envelope.topic,
            });
        }

        let errors = validate(envelope);
        if !errors.is_empty() {
            return Err(BusError::InvalidEnvelope {
                event_id: envelope.event_id.clone(),
                errors,
            });
        }

        let inbox = self.layout.inbox(topic);
        if !inbox.is_dir() {
            return Err(BusError::MissingInbox(inbox));
        }

        let bytes = serde_json::to_vec_pretty(envelope)?;
        let temp = inbox.join(format!("{TEMP_PREFIX}{}", Uuid::new_v4().simple()));
        let target = inbox.join(envelope.file_name());

        if let Err(e) = self.fs.write_synced(&temp, &bytes) {
            self.discard(&temp);
            return Err(BusError::io(temp, e));
        }
        if target.symlink_metadata().is_ok() {
            self.discard(&temp);
            return Err(BusError::DuplicateEvent {
                event_id: envelope.event_id.clone(),
                path: target,
            });
        }
        if let Err(e) = self.fs.rename(&temp, &target) {
            self.discard(&temp);
            return Err(BusError::io(target, e));
        }

        debug!(
            topic = %topic,
            event_id = %envelope.event_id,
            packet_id = %envelope.packet_id,
            "Envelope published"
        );
        Ok(target)
    }

    fn discard(&self, temp: &Path) {
        match self.fs.remove_file(temp) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %temp.display(), error = %e, "Failed to remove temp file"),
        }
    }
}
