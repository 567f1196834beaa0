//! # Dead-Letter Manager
//!
//! Operator tooling for one topic's `dlq/` folder.
//!
//! - `list_events`: envelopes awaiting attention (diagnostics excluded)
//! - `replay`: move back to `inbox/` and drop the diagnostics file
//! - `purge`: delete everything in `dlq/` (irreversible)
//!
//! Replay is at-least-once: a handler that already had side effects before
//! failing will see the event again.

use crate::adapters::StdFileSystem;
use crate::error::{BusError, BusResult};
use crate::layout::{list_envelope_files, TopicLayout};
use crate::ports::FileSystemAdapter;
use crate::ERROR_SUFFIX;
use chrono::{DateTime, Utc};
use feeds_types::{is_event_id, FeedTopic};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Diagnostics written to `<eventId>.error.json` beside a dead-lettered
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterRecord {
    pub event_id: String,
    /// One-line failure message.
    pub error: String,
    /// Full error chain, or the panic message.
    pub trace: String,
    /// File name the envelope had in the inbox.
    pub original_file: String,
    pub failed_at: DateTime<Utc>,
}

/// Manages one topic's dead-letter folder.
pub struct DeadLetterManager<FS: FileSystemAdapter = StdFileSystem> {
    topic: FeedTopic,
    layout: TopicLayout,
    fs: FS,
}

impl DeadLetterManager<StdFileSystem> {
    #[must_use]
    pub fn new(topics_root: impl Into<PathBuf>, topic: FeedTopic) -> Self {
        Self::with_fs(topics_root, topic, StdFileSystem)
    }
}

impl<FS: FileSystemAdapter> DeadLetterManager<FS> {
    #[must_use]
    pub fn with_fs(topics_root: impl Into<PathBuf>, topic: FeedTopic, fs: FS) -> Self {
        Self {
            topic,
            layout: TopicLayout::new(topics_root),
            fs,
        }
    }

    #[must_use]
    pub fn topic(&self) -> FeedTopic {
        self.topic
    }

    /// Dead-lettered envelope files, sorted by name.
    ///
    /// # Errors
    ///
    /// Fails if the dlq folder cannot be listed.
    pub fn list_events(&self) -> BusResult<Vec<PathBuf>> {
        let dir = self.layout.dlq(self.topic);
        list_envelope_files(&dir).map_err(|e| BusError::io(dir, e))
    }

    /// Read the diagnostics recorded for `event_id`, if any.
    ///
    /// # Errors
    ///
    /// Fails if the diagnostics file exists but cannot be read or parsed.
    pub fn error_record(&self, event_id: &str) -> BusResult<Option<DeadLetterRecord>> {
        let path = self.error_path(event_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BusError::io(path, e)),
        }
    }

    /// Move dead-lettered envelopes back to the inbox.
    ///
    /// With `Some(event_id)` only that envelope is replayed; an unknown id
    /// replays nothing. With `None` every envelope in `dlq/` is replayed.
    /// Returns the number of envelopes moved.
    ///
    /// # Errors
    ///
    /// - [`BusError::InvalidEventId`] if `event_id` could not name an envelope
    ///   file, so nothing outside `dlq/` is ever touched
    /// - [`BusError::Io`] if the dlq folder cannot be listed or a rename
    ///   fails for a reason other than the file having already moved
    pub fn replay(&self, event_id: Option<&str>) -> BusResult<usize> {
        let targets = match event_id {
            Some(id) if !is_event_id(id) => return Err(BusError::InvalidEventId(id.to_string())),
            Some(id) => vec![self.layout.dlq(self.topic).join(format!("{id}.json"))],
            None => self.list_events()?,
        };

        let inbox = self.layout.inbox(self.topic);
        let mut replayed = 0;
        for path in targets {
            let (Some(name), Some(id)) = (path.file_name(), event_id_of(&path)) else {
                continue;
            };
            match self.fs.rename(&path, &inbox.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(BusError::io(path, e)),
            }
            if let Err(e) = self.fs.remove_file(&self.error_path(&id)) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(topic = %self.topic, event_id = %id, error = %e, "Failed to remove DLQ diagnostics");
                }
            }
            replayed += 1;
        }

        if replayed > 0 {
            info!(topic = %self.topic, replayed, "Replayed dead-lettered events");
        }
        Ok(replayed)
    }

    /// Delete every file in `dlq/`, envelopes and diagnostics alike.
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Fails if the dlq folder cannot be listed or a file cannot be removed.
    pub fn purge(&self) -> BusResult<usize> {
        let dir = self.layout.dlq(self.topic);
        let entries = fs::read_dir(&dir).map_err(|e| BusError::io(&dir, e))?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| BusError::io(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match self.fs.remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(BusError::io(path, e)),
            }
        }

        warn!(topic = %self.topic, removed, "Purged dead-letter queue");
        Ok(removed)
    }

    fn error_path(&self, event_id: &str) -> PathBuf {
        self.layout
            .dlq(self.topic)
            .join(format!("{event_id}{ERROR_SUFFIX}"))
    }
}

/// Event id encoded in an envelope file name (`<eventId>.json`).
pub(crate) fn event_id_of(path: &Path) -> Option<String> {
    path.file_name()?
        .to_str()?
        .strip_suffix(".json")
        .map(str::to_string)
}
