//! # Topic Payloads
//!
//! Typed shapes for the body of each topic's envelopes.
//!
//! Payloads travel as raw JSON so the hash is computed over exactly what the
//! producer sent; these types exist to check that raw JSON against the shape
//! its topic requires. Unknown extra fields are tolerated.

use crate::hashing::is_payload_hash;
use crate::topic::{FeedTopic, RecordType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Seal attached to sealed artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seal {
    pub hash: String,
    pub sealed_at: DateTime<Utc>,
    pub version: u32,
}

/// Payload of `truth_snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruthSnapshot {
    pub snapshot_id: String,
    pub captured_at: DateTime<Utc>,
    pub claims: Vec<Value>,
    pub evidence_summary: String,
    pub coherence_score: f64,
    pub seal: Seal,
}

/// Payload of `authority_slice`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritySlice {
    pub slice_id: String,
    pub authority_source: String,
    pub authority_role: String,
    pub scope: String,
    pub claims_blessed: Vec<String>,
    pub effective_at: DateTime<Utc>,
    pub seal: Seal,
}

/// Decision outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub code: String,
}

/// Payload of `decision_lineage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLineage {
    pub dlr_id: String,
    pub episode_id: String,
    pub decision_type: String,
    pub recorded_at: DateTime<Utc>,
    /// Claims grouped by role (`context`, `rationale`, `action`, ...).
    pub claims: serde_json::Map<String, Value>,
    pub outcome: Outcome,
    pub seal: Seal,
}

/// Kind of inconsistency a drift signal reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    Time,
    Freshness,
    Fallback,
    Bypass,
    Verify,
    Outcome,
    Fanout,
    Contention,
    AuthorityMismatch,
    ProcessGap,
    ConfidenceDecay,
    CanonInflation,
    Contradiction,
}

impl DriftType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DriftType::Time => "time",
            DriftType::Freshness => "freshness",
            DriftType::Fallback => "fallback",
            DriftType::Bypass => "bypass",
            DriftType::Verify => "verify",
            DriftType::Outcome => "outcome",
            DriftType::Fanout => "fanout",
            DriftType::Contention => "contention",
            DriftType::AuthorityMismatch => "authority_mismatch",
            DriftType::ProcessGap => "process_gap",
            DriftType::ConfidenceDecay => "confidence_decay",
            DriftType::CanonInflation => "canon_inflation",
            DriftType::Contradiction => "contradiction",
        }
    }
}

/// Drift severity, traffic-light scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Green => "green",
            Severity::Yellow => "yellow",
            Severity::Red => "red",
        }
    }
}

/// Dedup fingerprint of a drift signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub key: String,
    pub version: String,
}

/// Payload of `drift_signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSignal {
    pub drift_id: String,
    pub drift_type: DriftType,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    pub evidence_refs: Vec<String>,
    pub recommended_patch_type: String,
    pub fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload of `canon_entry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonEntry {
    pub canon_id: String,
    pub title: String,
    pub claim_ids: Vec<String>,
    pub blessed_by: String,
    pub blessed_at: DateTime<Utc>,
    pub version: String,
    pub seal: Seal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
}

/// One artifact listed by a packet index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    pub topic: FeedTopic,
    pub record_type: RecordType,
    pub event_id: String,
    pub payload_hash: String,
}

/// Payload of `packet_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketIndex {
    pub packet_id: String,
    pub created_at: DateTime<Utc>,
    pub producer: String,
    pub artifact_manifest: Vec<ArtifactRef>,
    pub total_events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal: Option<Seal>,
}

/// A payload parsed against its topic's shape.
///
/// Dispatch is a closed `match` on [`FeedTopic`].
#[derive(Debug, Clone, PartialEq)]
pub enum TopicPayload {
    TruthSnapshot(TruthSnapshot),
    AuthoritySlice(AuthoritySlice),
    DecisionLineage(DecisionLineage),
    DriftSignal(DriftSignal),
    CanonEntry(CanonEntry),
    PacketIndex(PacketIndex),
}

impl TopicPayload {
    /// Parse `payload` as the shape `topic` requires.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's description of the first shape violation
    /// (missing field, wrong type, unknown enum value).
    pub fn parse(topic: FeedTopic, payload: &Value) -> Result<Self, String> {
        let parsed = match topic {
            FeedTopic::TruthSnapshot => TruthSnapshot::deserialize(payload).map(Self::TruthSnapshot),
            FeedTopic::AuthoritySlice => {
                AuthoritySlice::deserialize(payload).map(Self::AuthoritySlice)
            }
            FeedTopic::DecisionLineage => {
                DecisionLineage::deserialize(payload).map(Self::DecisionLineage)
            }
            FeedTopic::DriftSignal => DriftSignal::deserialize(payload).map(Self::DriftSignal),
            FeedTopic::CanonEntry => CanonEntry::deserialize(payload).map(Self::CanonEntry),
            FeedTopic::PacketIndex => PacketIndex::deserialize(payload).map(Self::PacketIndex),
        };
        parsed.map_err(|e| e.to_string())
    }

    #[must_use]
    pub fn topic(&self) -> FeedTopic {
        match self {
            Self::TruthSnapshot(_) => FeedTopic::TruthSnapshot,
            Self::AuthoritySlice(_) => FeedTopic::AuthoritySlice,
            Self::DecisionLineage(_) => FeedTopic::DecisionLineage,
            Self::DriftSignal(_) => FeedTopic::DriftSignal,
            Self::CanonEntry(_) => FeedTopic::CanonEntry,
            Self::PacketIndex(_) => FeedTopic::PacketIndex,
        }
    }

    /// Value rules the type system cannot express. Empty means the payload
    /// is well formed.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            Self::TruthSnapshot(ts) => {
                require_non_empty(&mut out, "snapshotId", &ts.snapshot_id);
                if !(0.0..=100.0).contains(&ts.coherence_score) {
                    out.push(format!(
                        "coherenceScore must be within 0..=100, got {}",
                        ts.coherence_score
                    ));
                }
            }
            Self::AuthoritySlice(als) => {
                require_non_empty(&mut out, "sliceId", &als.slice_id);
                require_non_empty(&mut out, "authoritySource", &als.authority_source);
            }
            Self::DecisionLineage(dlr) => {
                require_non_empty(&mut out, "dlrId", &dlr.dlr_id);
                require_non_empty(&mut out, "outcome.code", &dlr.outcome.code);
            }
            Self::DriftSignal(ds) => {
                require_non_empty(&mut out, "driftId", &ds.drift_id);
                require_non_empty(&mut out, "fingerprint.key", &ds.fingerprint.key);
            }
            Self::CanonEntry(ce) => {
                if !ce
                    .canon_id
                    .strip_prefix("CANON-")
                    .is_some_and(|rest| !rest.is_empty())
                {
                    out.push(format!("canonId must start with CANON-, got {}", ce.canon_id));
                }
            }
            Self::PacketIndex(pi) => {
                require_non_empty(&mut out, "packetId", &pi.packet_id);
                for artifact in &pi.artifact_manifest {
                    if artifact.record_type != artifact.topic.record_type() {
                        out.push(format!(
                            "artifact {} lists recordType {} for topic {}",
                            artifact.event_id, artifact.record_type, artifact.topic
                        ));
                    }
                    if !is_payload_hash(&artifact.payload_hash) {
                        out.push(format!(
                            "artifact {} has malformed payloadHash",
                            artifact.event_id
                        ));
                    }
                }
            }
        }
        out
    }
}

fn require_non_empty(out: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        out.push(format!("{field} must not be empty"));
    }
}
