//! # Ingest Orchestrator
//!
//! All-or-none ingest of one packet directory.
//!
//! ## State Machine
//!
//! ```text
//! [VERIFY] ──ok──→ [EXTRACT] ──ok──→ [STAGE] ──ok──→ [COMMIT] ──ok──→ done
//!    │                 │                │                │
//!    └─────────────────┴────────────────┴────────────────┴──err──→ [FAIL]
//!                                                                    │
//!                        rollback committed files, emit process_gap ←┘
//! ```
//!
//! - **VERIFY**: every declared artifact exists and matches its declared
//!   hash. All problems are collected before failing.
//! - **EXTRACT**: one envelope per artifact (sequence 1..n), then the
//!   `packet_index` envelope at sequence 0.
//! - **STAGE**: envelopes written under `<topics_root>/.staging/`, never
//!   visible to consumers.
//! - **COMMIT**: one rename per envelope into its inbox. A failed rename
//!   removes the files this packet already committed.
//!
//! The staging directory is removed on every path.

use crate::diagnostics::emit_process_gap;
use crate::error::IngestError;
use crate::extractors::{
    extract, read_artifact, resolve_sources, synthesize_packet_index, ArtifactSource, Extracted,
};
use crate::manifest::Manifest;
use chrono::{DateTime, Utc};
use feeds_bus::{FileSystemAdapter, Publisher, StdFileSystem, TopicLayout};
use feeds_types::{compute_payload_hash, validate, Classification, Envelope, FeedTopic};
use serde::Serialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Producer stamped on ingested envelopes unless overridden.
pub const DEFAULT_PRODUCER: &str = "feeds-ingest";

/// Outcome of one ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub success: bool,
    pub packet_id: String,
    pub events_published: usize,
    /// Committed event ids in sequence order; the packet index comes first.
    pub event_ids: Vec<String>,
    #[serde(serialize_with = "display_all")]
    pub errors: Vec<IngestError>,
    /// Id of the `process_gap` drift emitted for a failure, if it was
    /// published.
    pub drift_signal_id: Option<String>,
}

fn display_all<S: serde::Serializer>(errors: &[IngestError], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(errors.iter().map(ToString::to_string))
}

/// Ingests packet directories into a topics root.
pub struct IngestOrchestrator<FS: FileSystemAdapter = StdFileSystem> {
    layout: TopicLayout,
    producer: String,
    classification: Classification,
    fs: FS,
}

impl IngestOrchestrator<StdFileSystem> {
    #[must_use]
    pub fn new(topics_root: impl Into<PathBuf>) -> Self {
        Self::with_fs(topics_root, StdFileSystem)
    }
}

impl<FS: FileSystemAdapter> IngestOrchestrator<FS> {
    #[must_use]
    pub fn with_fs(topics_root: impl Into<PathBuf>, fs: FS) -> Self {
        Self {
            layout: TopicLayout::new(topics_root),
            producer: DEFAULT_PRODUCER.to_string(),
            classification: Classification::default(),
            fs,
        }
    }

    #[must_use]
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    #[must_use]
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    /// Ingest the packet in `packet_dir`.
    ///
    /// Never panics and never returns an error: every failure is described
    /// in the returned report.
    pub fn ingest(&self, packet_dir: impl AsRef<Path>) -> IngestReport {
        let packet_dir = packet_dir.as_ref();

        let manifest = match Manifest::load(packet_dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(packet_dir = %packet_dir.display(), error = %e, "Ingest rejected");
                return IngestReport::failed("unknown".to_string(), vec![e], None);
            }
        };
        let packet_id = manifest.packet_id_or_default();
        debug!(packet_id = %packet_id, "VERIFY");

        let (sources, mut errors) = resolve_sources(packet_dir, &manifest);
        let mut verified = Vec::with_capacity(sources.len());
        for source in &sources {
            match verify(source) {
                Ok(raw) => verified.push((source, raw)),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return self.fail(packet_id, errors);
        }

        debug!(packet_id = %packet_id, artifacts = verified.len(), "EXTRACT");
        let envelopes = match self.build_envelopes(&packet_id, &manifest, verified) {
            Ok(envelopes) => envelopes,
            Err(errors) => return self.fail(packet_id, errors),
        };

        debug!(packet_id = %packet_id, envelopes = envelopes.len(), "STAGE");
        if let Err(e) = self.stage_and_commit(&packet_id, &envelopes) {
            return self.fail(packet_id, vec![e]);
        }

        info!(packet_id = %packet_id, events = envelopes.len(), "Packet committed");
        IngestReport {
            success: true,
            packet_id,
            events_published: envelopes.len(),
            event_ids: envelopes.into_iter().map(|env| env.event_id).collect(),
            errors: Vec::new(),
            drift_signal_id: None,
        }
    }

    /// Build the packet's envelopes: index first (sequence 0), then
    /// artifacts in catalogue order.
    fn build_envelopes(
        &self,
        packet_id: &str,
        manifest: &Manifest,
        verified: Vec<(&ArtifactSource, Value)>,
    ) -> Result<Vec<Envelope>, Vec<IngestError>> {
        let created_at = Utc::now();
        let mut errors = Vec::new();
        let mut artifacts = Vec::new();
        let mut index_payload = manifest.packet_index.clone();

        for (source, raw) in verified {
            match extract(source.topic, &source.file, raw) {
                Ok(None) => debug!(packet_id = %packet_id, file = %source.file, "Empty artifact skipped"),
                Ok(Some(extracted)) if extracted.topic == FeedTopic::PacketIndex => {
                    index_payload.get_or_insert(extracted.payload);
                }
                Ok(Some(extracted)) => {
                    let sequence = artifacts.len() as u64 + 1;
                    artifacts.push(self.envelope(packet_id, extracted, sequence, created_at));
                }
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() && artifacts.is_empty() {
            errors.push(IngestError::NoArtifacts);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let index_payload = index_payload
            .filter(|payload| payload.as_object().is_some_and(|map| !map.is_empty()))
            .unwrap_or_else(|| {
                synthesize_packet_index(packet_id, &self.producer, created_at, &artifacts)
            });
        let index = match extract(FeedTopic::PacketIndex, "manifest.json", index_payload) {
            Ok(Some(extracted)) => self.envelope(packet_id, extracted, 0, created_at),
            Ok(None) => return Err(vec![IngestError::NoArtifacts]),
            Err(e) => return Err(vec![e]),
        };

        let mut envelopes = Vec::with_capacity(artifacts.len() + 1);
        envelopes.push(index);
        envelopes.extend(artifacts);

        for env in &envelopes {
            let problems = validate(env);
            if !problems.is_empty() {
                errors.push(IngestError::InvalidEnvelope {
                    topic: env.topic,
                    reason: problems
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; "),
                });
            }
        }
        if errors.is_empty() {
            Ok(envelopes)
        } else {
            Err(errors)
        }
    }

    fn envelope(
        &self,
        packet_id: &str,
        extracted: Extracted,
        sequence: u64,
        created_at: DateTime<Utc>,
    ) -> Envelope {
        let mut builder =
            Envelope::builder(extracted.topic, extracted.payload, packet_id, &self.producer)
                .with_classification(self.classification)
                .with_sequence(sequence)
                .with_created_at(created_at);
        if let Some(human_id) = extracted.human_id {
            builder = builder.with_human_id(human_id);
        }
        builder.build()
    }

    fn stage_and_commit(&self, packet_id: &str, envelopes: &[Envelope]) -> Result<(), IngestError> {
        for env in envelopes {
            if !self.layout.inbox(env.topic).is_dir() {
                return Err(IngestError::MissingInbox { topic: env.topic });
            }
        }

        let staging = self
            .layout
            .staging_root()
            .join(format!("{packet_id}-{}", Uuid::new_v4().simple()));
        let result = self
            .fs
            .create_dir_all(&staging)
            .map_err(|e| IngestError::Staging {
                reason: format!("{}: {e}", staging.display()),
            })
            .and_then(|()| self.stage(&staging, envelopes))
            .and_then(|staged| {
                debug!(packet_id = %packet_id, "COMMIT");
                self.commit(packet_id, staged)
            });

        match self.fs.remove_dir_all(&staging) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(packet_id = %packet_id, error = %e, "Failed to remove staging directory"),
        }
        result
    }

    fn stage(&self, staging: &Path, envelopes: &[Envelope]) -> Result<Vec<(PathBuf, PathBuf)>, IngestError> {
        let mut staged = Vec::with_capacity(envelopes.len());
        for env in envelopes {
            let path = staging.join(format!("{}_{}", env.topic, env.file_name()));
            let bytes = serde_json::to_vec_pretty(env).map_err(|e| IngestError::Staging {
                reason: e.to_string(),
            })?;
            self.fs
                .write_synced(&path, &bytes)
                .map_err(|e| IngestError::Staging {
                    reason: format!("{}: {e}", path.display()),
                })?;
            staged.push((path, self.layout.inbox(env.topic).join(env.file_name())));
        }
        Ok(staged)
    }

    fn commit(&self, packet_id: &str, staged: Vec<(PathBuf, PathBuf)>) -> Result<(), IngestError> {
        let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (from, to) in staged {
            if let Err(e) = self.fs.rename(&from, &to) {
                self.rollback(packet_id, &committed);
                return Err(IngestError::Commit {
                    reason: format!("{}: {e}", to.display()),
                });
            }
            committed.push(to);
        }
        Ok(())
    }

    fn rollback(&self, packet_id: &str, committed: &[PathBuf]) {
        for path in committed.iter().rev() {
            match self.fs.remove_file(path) {
                Ok(()) => {}
                // Already claimed by a consumer.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(packet_id = %packet_id, path = %path.display(), "Committed envelope consumed before rollback");
                }
                Err(e) => {
                    error!(packet_id = %packet_id, path = %path.display(), error = %e, "Rollback failed to remove envelope");
                }
            }
        }
        warn!(packet_id = %packet_id, rolled_back = committed.len(), "Partial commit rolled back");
    }

    fn fail(&self, packet_id: String, errors: Vec<IngestError>) -> IngestReport {
        for e in &errors {
            warn!(packet_id = %packet_id, error = %e, "Ingest failed");
        }
        let drift_signal_id = if errors.iter().any(IngestError::emits_drift) {
            let publisher = Publisher::with_fs(self.layout.root().to_path_buf(), &self.fs);
            emit_process_gap(&publisher, &packet_id, &self.producer, self.classification, &errors)
        } else {
            None
        };
        IngestReport::failed(packet_id, errors, drift_signal_id)
    }
}

impl IngestReport {
    fn failed(packet_id: String, errors: Vec<IngestError>, drift_signal_id: Option<String>) -> Self {
        Self {
            success: false,
            packet_id,
            events_published: 0,
            event_ids: Vec::new(),
            errors,
            drift_signal_id,
        }
    }
}

/// Read an artifact and check it against its declared hash.
fn verify(source: &ArtifactSource) -> Result<Value, IngestError> {
    let raw = read_artifact(source)?;
    if let Some(expected) = &source.expected_hash {
        let actual = compute_payload_hash(&raw);
        if &actual != expected {
            return Err(IngestError::HashMismatch {
                file: source.file.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(raw)
}
