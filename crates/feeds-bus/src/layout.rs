//! # Topic Layout
//!
//! Path arithmetic for the on-disk queue and its idempotent initializer.

use crate::error::{BusError, BusResult};
use crate::ERROR_SUFFIX;
use feeds_types::FeedTopic;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the hidden directory holding per-packet ingest staging areas.
const STAGING_DIR: &str = ".staging";

/// Lifecycle folder of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Inbox,
    Processing,
    Ack,
    Dlq,
}

impl Lifecycle {
    pub const ALL: [Lifecycle; 4] = [
        Lifecycle::Inbox,
        Lifecycle::Processing,
        Lifecycle::Ack,
        Lifecycle::Dlq,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Inbox => "inbox",
            Lifecycle::Processing => "processing",
            Lifecycle::Ack => "ack",
            Lifecycle::Dlq => "dlq",
        }
    }
}

/// Envelope counts per lifecycle folder of one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepths {
    pub inbox: usize,
    pub processing: usize,
    pub ack: usize,
    pub dlq: usize,
}

impl QueueDepths {
    #[must_use]
    pub fn total(&self) -> usize {
        self.inbox + self.processing + self.ack + self.dlq
    }
}

/// Resolves every path of the queue under one topics root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLayout {
    root: PathBuf,
}

impl TopicLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn topic_dir(&self, topic: FeedTopic) -> PathBuf {
        self.root.join(topic.as_str())
    }

    #[must_use]
    pub fn folder(&self, topic: FeedTopic, stage: Lifecycle) -> PathBuf {
        self.topic_dir(topic).join(stage.as_str())
    }

    #[must_use]
    pub fn inbox(&self, topic: FeedTopic) -> PathBuf {
        self.folder(topic, Lifecycle::Inbox)
    }

    #[must_use]
    pub fn processing(&self, topic: FeedTopic) -> PathBuf {
        self.folder(topic, Lifecycle::Processing)
    }

    #[must_use]
    pub fn ack(&self, topic: FeedTopic) -> PathBuf {
        self.folder(topic, Lifecycle::Ack)
    }

    #[must_use]
    pub fn dlq(&self, topic: FeedTopic) -> PathBuf {
        self.folder(topic, Lifecycle::Dlq)
    }

    /// Parent of the per-packet staging areas. It sits under the topics
    /// root so that commit renames never cross a volume boundary.
    #[must_use]
    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Count the envelopes currently in each lifecycle folder of `topic`.
    ///
    /// # Errors
    ///
    /// Fails if a folder exists but cannot be listed. Missing folders count
    /// as empty.
    pub fn depths(&self, topic: FeedTopic) -> BusResult<QueueDepths> {
        let count = |stage| -> BusResult<usize> {
            let dir = self.folder(topic, stage);
            match list_envelope_files(&dir) {
                Ok(files) => Ok(files.len()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
                Err(e) => Err(BusError::io(dir, e)),
            }
        };
        Ok(QueueDepths {
            inbox: count(Lifecycle::Inbox)?,
            processing: count(Lifecycle::Processing)?,
            ack: count(Lifecycle::Ack)?,
            dlq: count(Lifecycle::Dlq)?,
        })
    }
}

/// Create the four lifecycle folders for `topics` (all topics when `None`)
/// under `root`. Idempotent.
///
/// Returns the canonicalized root.
///
/// # Errors
///
/// Fails if a directory cannot be created.
pub fn init_topic_layout(
    root: impl AsRef<Path>,
    topics: Option<&[FeedTopic]>,
) -> BusResult<PathBuf> {
    let root = root.as_ref();
    let topics = topics.unwrap_or(&FeedTopic::ALL);
    let layout = TopicLayout::new(root);

    for &topic in topics {
        for stage in Lifecycle::ALL {
            let dir = layout.folder(topic, stage);
            fs::create_dir_all(&dir).map_err(|e| BusError::io(&dir, e))?;
        }
    }
    fs::create_dir_all(root).map_err(|e| BusError::io(root, e))?;
    let resolved = root.canonicalize().map_err(|e| BusError::io(root, e))?;

    debug!(root = %resolved.display(), topics = topics.len(), "Topic layout initialized");
    Ok(resolved)
}

/// Whether `name` is a consumable envelope file name.
#[must_use]
pub(crate) fn is_envelope_file_name(name: &str) -> bool {
    // Hidden names cover in-flight temp files.
    name.ends_with(".json") && !name.ends_with(ERROR_SUFFIX) && !name.starts_with('.')
}

/// Envelope files in `dir`, sorted by file name.
///
/// Generated event ids are time-ordered, so name order approximates
/// publication order. Temp files and DLQ diagnostics are excluded.
pub(crate) fn list_envelope_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_envelope_file_name(name) && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
