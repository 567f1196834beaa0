//! # Subscriber
//!
//! Claims envelopes from one topic's inbox and runs a handler over them.
//!
//! ## Poll Pass
//!
//! ```text
//! for each of the oldest `batch_size` files in inbox/:
//!     rename inbox → processing        (NotFound: another worker won, skip)
//!     parse + validate                 (failure: dead-letter)
//!     handler(&envelope)               (Err or panic: dead-letter)
//!     rename processing → ack
//! ```
//!
//! Handler failures never escape `poll`: they become a `dlq/` entry with a
//! `<eventId>.error.json` diagnostics file beside it.

use crate::adapters::StdFileSystem;
use crate::dlq::{event_id_of, DeadLetterRecord};
use crate::error::{BusError, BusResult};
use crate::layout::{list_envelope_files, TopicLayout};
use crate::ports::FileSystemAdapter;
use crate::ERROR_SUFFIX;
use chrono::Utc;
use feeds_types::{validate_value, Envelope, FeedTopic};
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;
use std::fs;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Outcome of one `poll` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Files this worker won the claim race for.
    pub claimed: usize,
    pub acked: usize,
    pub dead_lettered: usize,
}

/// Why a claimed envelope could not be acknowledged.
struct Failure {
    error: String,
    trace: String,
}

/// Consumes one topic.
pub struct Subscriber<FS: FileSystemAdapter = StdFileSystem> {
    topic: FeedTopic,
    layout: TopicLayout,
    fs: FS,
}

impl Subscriber<StdFileSystem> {
    #[must_use]
    pub fn new(topics_root: impl Into<PathBuf>, topic: FeedTopic) -> Self {
        Self::with_fs(topics_root, topic, StdFileSystem)
    }
}

impl<FS: FileSystemAdapter> Subscriber<FS> {
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

    /// Up to `limit` inbox files, oldest name first.
    ///
    /// # Errors
    ///
    /// [`BusError::MissingInbox`] if the layout was never initialized.
    pub fn list_inbox(&self, limit: usize) -> BusResult<Vec<PathBuf>> {
        let inbox = self.layout.inbox(self.topic);
        match list_envelope_files(&inbox) {
            Ok(mut files) => {
                files.truncate(limit);
                Ok(files)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BusError::MissingInbox(inbox)),
            Err(e) => Err(BusError::io(inbox, e)),
        }
    }

    /// Run one pass and return the number of envelopes acknowledged.
    ///
    /// # Errors
    ///
    /// Only if the inbox cannot be listed. Per-file failures are logged or
    /// dead-lettered.
    pub fn poll<F>(&self, handler: F, batch_size: usize) -> BusResult<usize>
    where
        F: FnMut(&Envelope) -> anyhow::Result<()>,
    {
        self.poll_report(handler, batch_size)
            .map(|report| report.acked)
    }

    /// Run one pass and return the full breakdown.
    ///
    /// # Errors
    ///
    /// Same as [`Subscriber::poll`].
    pub fn poll_report<F>(&self, mut handler: F, batch_size: usize) -> BusResult<PollReport>
    where
        F: FnMut(&Envelope) -> anyhow::Result<()>,
    {
        let mut report = PollReport::default();

        for inbox_path in self.list_inbox(batch_size)? {
            let Some(name) = inbox_path.file_name().map(ToOwned::to_owned) else {
                continue;
            };
            let processing_path = self.layout.processing(self.topic).join(&name);

            match self.fs.rename(&inbox_path, &processing_path) {
                Ok(()) => report.claimed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(topic = %self.topic, path = %inbox_path.display(), error = %e, "Claim failed");
                    continue;
                }
            }

            let outcome = load_envelope(&processing_path, self.topic)
                .and_then(|envelope| run_handler(&mut handler, &envelope).map(|()| envelope));

            match outcome {
                Ok(envelope) => {
                    let ack_path = self.layout.ack(self.topic).join(&name);
                    match self.fs.rename(&processing_path, &ack_path) {
                        Ok(()) => {
                            report.acked += 1;
                            debug!(topic = %self.topic, event_id = %envelope.event_id, "Envelope acknowledged");
                        }
                        Err(e) => {
                            error!(topic = %self.topic, event_id = %envelope.event_id, error = %e, "Ack rename failed; envelope left in processing");
                        }
                    }
                }
                Err(failure) => {
                    if self.dead_letter(&processing_path, failure) {
                        report.dead_lettered += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Move a claimed file to `dlq/` and write its diagnostics. Returns
    /// whether the envelope reached the dlq.
    fn dead_letter(&self, processing_path: &Path, failure: Failure) -> bool {
        let Some(event_id) = event_id_of(processing_path) else {
            return false;
        };
        let original_file = format!("{event_id}.json");
        let dlq = self.layout.dlq(self.topic);

        if let Err(e) = self.fs.rename(processing_path, &dlq.join(&original_file)) {
            error!(topic = %self.topic, event_id = %event_id, error = %e, "Dead-letter rename failed; envelope left in processing");
            return false;
        }
        warn!(topic = %self.topic, event_id = %event_id, error = %failure.error, "Envelope dead-lettered");

        let record = DeadLetterRecord {
            event_id: event_id.clone(),
            error: failure.error,
            trace: failure.trace,
            original_file,
            failed_at: Utc::now(),
        };
        let error_path = dlq.join(format!("{event_id}{ERROR_SUFFIX}"));
        let written = serde_json::to_vec_pretty(&record)
            .map_err(io::Error::from)
            .and_then(|bytes| {
                // A stale record from an earlier failure of the same event.
                let _ = self.fs.remove_file(&error_path);
                self.fs.write_synced(&error_path, &bytes)
            });
        if let Err(e) = written {
            error!(topic = %self.topic, event_id = %event_id, error = %e, "Failed to write DLQ diagnostics");
        }
        true
    }
}

/// Read, validate and check that the envelope belongs where it was found:
/// in this topic's folder under its own `<eventId>.json` name.
fn load_envelope(path: &Path, topic: FeedTopic) -> Result<Envelope, Failure> {
    let bytes = fs::read(path).map_err(|e| Failure {
        error: format!("unreadable envelope: {e}"),
        trace: format!("{e:?}"),
    })?;
    let raw: Value = serde_json::from_slice(&bytes).map_err(|e| Failure {
        error: format!("malformed JSON: {e}"),
        trace: format!("{e:?}"),
    })?;

    let errors = validate_value(&raw);
    if !errors.is_empty() {
        let error = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Failure {
            error: format!("invalid envelope: {error}"),
            trace: format!("{errors:#?}"),
        });
    }

    let envelope = Envelope::deserialize(&raw).map_err(|e| Failure {
        error: format!("invalid envelope: {e}"),
        trace: format!("{e:?}"),
    })?;

    if envelope.topic != topic {
        return Err(Failure {
            error: format!("misrouted envelope: topic {} found in {topic}", envelope.topic),
            trace: format!("path: {}", path.display()),
        });
    }
    let stem = event_id_of(path).unwrap_or_default();
    if stem != envelope.event_id {
        return Err(Failure {
            error: format!(
                "misnamed envelope: file {stem}.json holds eventId {}",
                envelope.event_id
            ),
            trace: format!("path: {}", path.display()),
        });
    }
    Ok(envelope)
}

fn run_handler<F>(handler: &mut F, envelope: &Envelope) -> Result<(), Failure>
where
    F: FnMut(&Envelope) -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(|| handler(envelope))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Failure {
            error: format!("{e:#}"),
            trace: format!("{e:?}"),
        }),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            Err(Failure {
                error: format!("handler panicked: {message}"),
                trace: message,
            })
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
