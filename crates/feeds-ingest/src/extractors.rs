//! # Per-Topic Extractors
//!
//! Turn the files of a packet into envelope payloads.
//!
//! Each topic's artifact file holds its payload as a single JSON object. The
//! extractor also lifts the artifact's own identifier (`snapshotId`,
//! `canonId`, ...) into the envelope's `humanId`. Dispatch is a closed
//! `match` on [`FeedTopic`].

use crate::error::IngestError;
use crate::manifest::Manifest;
use chrono::{DateTime, SecondsFormat, Utc};
use feeds_types::{Envelope, FeedTopic};
use serde_json::{json, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A payload pulled from a packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub topic: FeedTopic,
    pub payload: Value,
    pub human_id: Option<String>,
}

/// Where one topic's artifact lives inside the packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub topic: FeedTopic,
    /// File name as declared (or conventional).
    pub file: String,
    pub path: PathBuf,
    pub expected_hash: Option<String>,
}

/// Resolve the artifacts to ingest, in catalogue order.
///
/// Declared artifacts win; with none declared, every `<topic>.json` present
/// in `packet_dir` is picked up. Unknown topic keys and paths escaping the
/// packet directory are reported, not skipped.
#[must_use]
pub fn resolve_sources(
    packet_dir: &Path,
    manifest: &Manifest,
) -> (Vec<ArtifactSource>, Vec<IngestError>) {
    let mut sources = Vec::new();
    let mut errors = Vec::new();

    if manifest.artifacts.is_empty() {
        for topic in FeedTopic::ARTIFACTS {
            let file = topic.artifact_file_name();
            let path = packet_dir.join(&file);
            if path.is_file() {
                sources.push(ArtifactSource {
                    topic,
                    file,
                    path,
                    expected_hash: None,
                });
            }
        }
        return (sources, errors);
    }

    for (name, decl) in &manifest.artifacts {
        let Ok(topic) = name.parse::<FeedTopic>() else {
            errors.push(IngestError::UnknownTopic {
                topic: name.clone(),
            });
            continue;
        };
        let file = decl
            .file
            .clone()
            .unwrap_or_else(|| topic.artifact_file_name());
        if !is_contained(&file) {
            errors.push(IngestError::PathEscape { file });
            continue;
        }
        sources.push(ArtifactSource {
            topic,
            path: packet_dir.join(&file),
            file,
            expected_hash: decl.hash.clone(),
        });
    }
    sources.sort_by_key(|s| s.topic);
    (sources, errors)
}

/// Read an artifact's JSON content.
///
/// # Errors
///
/// [`IngestError::MissingArtifact`] or [`IngestError::UnreadableArtifact`].
pub fn read_artifact(source: &ArtifactSource) -> Result<Value, IngestError> {
    let bytes = fs::read(&source.path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IngestError::MissingArtifact {
            file: source.file.clone(),
        },
        _ => IngestError::UnreadableArtifact {
            file: source.file.clone(),
            reason: e.to_string(),
        },
    })?;
    serde_json::from_slice(&bytes).map_err(|e| IngestError::UnreadableArtifact {
        file: source.file.clone(),
        reason: e.to_string(),
    })
}

/// Extract `topic`'s payload from an artifact's content.
///
/// An empty object yields `None`: the artifact is present but carries
/// nothing to publish.
///
/// # Errors
///
/// [`IngestError::UnreadableArtifact`] if the content is not an object.
pub fn extract(topic: FeedTopic, file: &str, raw: Value) -> Result<Option<Extracted>, IngestError> {
    let Value::Object(map) = &raw else {
        return Err(IngestError::UnreadableArtifact {
            file: file.to_string(),
            reason: "expected a JSON object".into(),
        });
    };
    if map.is_empty() {
        return Ok(None);
    }

    let id_field = match topic {
        FeedTopic::TruthSnapshot => "snapshotId",
        FeedTopic::AuthoritySlice => "sliceId",
        FeedTopic::DecisionLineage => "dlrId",
        FeedTopic::DriftSignal => "driftId",
        FeedTopic::CanonEntry => "canonId",
        FeedTopic::PacketIndex => "packetId",
    };
    let human_id = map.get(id_field).and_then(Value::as_str).map(str::to_string);

    Ok(Some(Extracted {
        topic,
        payload: raw,
        human_id,
    }))
}

/// Build a `packet_index` payload listing every artifact envelope.
#[must_use]
pub fn synthesize_packet_index(
    packet_id: &str,
    producer: &str,
    created_at: DateTime<Utc>,
    artifacts: &[Envelope],
) -> Value {
    let manifest: Vec<Value> = artifacts
        .iter()
        .map(|env| {
            json!({
                "topic": env.topic,
                "recordType": env.record_type,
                "eventId": env.event_id,
                "payloadHash": env.payload_hash,
            })
        })
        .collect();
    json!({
        "packetId": packet_id,
        "createdAt": created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "producer": producer,
        "artifactManifest": manifest,
        "totalEvents": artifacts.len(),
    })
}

/// Whether a declared file name stays inside the packet directory.
fn is_contained(file: &str) -> bool {
    let path = Path::new(file);
    !file.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
