//! Shared test fixtures: a scratch topics root and one valid payload per
//! artifact topic.

use feeds_bus::init_topic_layout;
use feeds_types::{compute_payload_hash, Envelope, FeedTopic};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKET_ID: &str = "CP-2026-02-27-0001";
pub const PRODUCER: &str = "feeds-tests";

/// Temporary directory holding an initialized topics root.
pub struct Scratch {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = init_topic_layout(dir.path().join("topics"), None).unwrap();
        Self { dir, root }
    }

    /// A fresh, empty packet directory beside the topics root.
    pub fn packet_dir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn triage_store_path(&self) -> PathBuf {
        self.dir.path().join("triage").join("store.json")
    }
}

pub fn count_files(dir: &Path, suffix: &str) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .count()
}

pub fn read_envelopes(dir: &Path) -> Vec<Envelope> {
    let mut out: Vec<Envelope> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| !p.to_string_lossy().ends_with(".error.json"))
        .map(|p| serde_json::from_slice(&fs::read(p).unwrap()).unwrap())
        .collect();
    out.sort_by(|a, b| a.event_id.cmp(&b.event_id));
    out
}

// =============================================================================
// PAYLOADS
// =============================================================================

pub fn truth_snapshot(id: &str) -> Value {
    json!({
        "snapshotId": id,
        "capturedAt": "2026-02-27T10:00:00Z",
        "claims": [{"claimId": "CLAIM-2026-0001"}],
        "evidenceSummary": "Three independent sources agree.",
        "coherenceScore": 87,
        "seal": {"hash": "sha256:ts", "sealedAt": "2026-02-27T10:00:01Z", "version": 1}
    })
}

pub fn authority_slice(id: &str) -> Value {
    json!({
        "sliceId": id,
        "authoritySource": "governance-engine",
        "authorityRole": "policy-owner",
        "scope": "security-operations",
        "claimsBlessed": ["CLAIM-2026-0001"],
        "effectiveAt": "2026-02-27T09:00:00Z",
        "seal": {"hash": "sha256:als", "sealedAt": "2026-02-27T09:00:01Z", "version": 1}
    })
}

pub fn decision_lineage(id: &str) -> Value {
    json!({
        "dlrId": id,
        "episodeId": "EP-2026-0001",
        "decisionType": "deploy",
        "recordedAt": "2026-02-27T09:30:00Z",
        "claims": {"context": ["CLAIM-2026-0001"], "rationale": []},
        "outcome": {"code": "success"},
        "seal": {"hash": "sha256:dlr", "sealedAt": "2026-02-27T09:30:01Z", "version": 1}
    })
}

pub fn drift_signal(id: &str, severity: &str) -> Value {
    json!({
        "driftId": id,
        "driftType": "freshness",
        "severity": severity,
        "detectedAt": "2026-02-27T11:00:00Z",
        "evidenceRefs": ["ref-001"],
        "recommendedPatchType": "ttl_change",
        "fingerprint": {"key": format!("fp:{id}"), "version": "1"}
    })
}

pub fn canon_entry(id: &str) -> Value {
    json!({
        "canonId": id,
        "title": "Deployment SOP",
        "claimIds": ["CLAIM-2026-0001"],
        "blessedBy": "governance-engine",
        "blessedAt": "2026-02-27T09:00:00Z",
        "version": "1.0.0",
        "seal": {"hash": "sha256:canon", "sealedAt": "2026-02-27T09:00:01Z", "version": 1}
    })
}

pub fn envelope(topic: FeedTopic, payload: Value) -> Envelope {
    Envelope::builder(topic, payload, PACKET_ID, PRODUCER).build()
}

pub fn drift_envelope(id: &str) -> Envelope {
    envelope(FeedTopic::DriftSignal, drift_signal(id, "yellow"))
}

/// Write `payload` as `topic`'s artifact file and return its manifest
/// declaration.
pub fn write_artifact(packet: &Path, topic: FeedTopic, payload: &Value) -> Value {
    let file = topic.artifact_file_name();
    fs::write(packet.join(&file), serde_json::to_vec(payload).unwrap()).unwrap();
    json!({"file": file, "hash": compute_payload_hash(payload)})
}

pub fn write_manifest(packet: &Path, manifest: &Value) {
    fs::write(
        packet.join("manifest.json"),
        serde_json::to_vec_pretty(manifest).unwrap(),
    )
    .unwrap();
}

/// A packet carrying all five artifact topics, each declared with its hash.
pub fn full_packet(packet: &Path) {
    let artifacts = json!({
        "truth_snapshot": write_artifact(packet, FeedTopic::TruthSnapshot, &truth_snapshot("TS-001")),
        "authority_slice": write_artifact(packet, FeedTopic::AuthoritySlice, &authority_slice("ALS-001")),
        "decision_lineage": write_artifact(packet, FeedTopic::DecisionLineage, &decision_lineage("DLR-001")),
        "drift_signal": write_artifact(packet, FeedTopic::DriftSignal, &drift_signal("DS-packet-001", "red")),
        "canon_entry": write_artifact(packet, FeedTopic::CanonEntry, &canon_entry("CANON-2026-0001")),
    });
    write_manifest(packet, &json!({"packetId": PACKET_ID, "artifacts": artifacts}));
}
