//! # Process-Gap Diagnostics
//!
//! A failed ingest reports itself on the bus as a red `process_gap` drift
//! signal so that triage picks it up like any other drift.
//!
//! Emission is best-effort: if the drift cannot be published the failure is
//! logged and the ingest report simply carries no drift id.

use crate::error::IngestError;
use crate::manifest::default_packet_id;
use chrono::{DateTime, SecondsFormat, Utc};
use feeds_bus::{FileSystemAdapter, Publisher};
use feeds_types::{is_packet_id, Classification, Envelope, FeedTopic};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

/// Drift id for an ingest failure: `DS-ingest-<12 hex>`.
#[must_use]
pub fn new_drift_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("DS-ingest-{}", &hex[..12])
}

/// `drift_signal` payload describing a failed ingest of `packet_id`.
#[must_use]
pub fn process_gap_payload(
    drift_id: &str,
    packet_id: &str,
    errors: &[IngestError],
    detected_at: DateTime<Utc>,
) -> Value {
    let notes = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    json!({
        "driftId": drift_id,
        "driftType": "process_gap",
        "severity": "red",
        "detectedAt": detected_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "evidenceRefs": [format!("packet:{packet_id}")],
        "recommendedPatchType": "process_fix",
        "fingerprint": {"key": format!("ingest:{packet_id}"), "version": "1"},
        "notes": notes,
    })
}

/// Publish a `process_gap` drift for a failed packet. Returns the drift id
/// when the signal reached the drift inbox.
///
/// Never fails: publication errors are logged.
pub fn emit_process_gap<FS: FileSystemAdapter>(
    publisher: &Publisher<FS>,
    packet_id: &str,
    producer: &str,
    classification: Classification,
    errors: &[IngestError],
) -> Option<String> {
    let drift_id = new_drift_id();
    let payload = process_gap_payload(&drift_id, packet_id, errors, Utc::now());

    // The evidence ref keeps the raw id; the envelope needs a well-formed one.
    let envelope_packet_id = if is_packet_id(packet_id) {
        packet_id.to_string()
    } else {
        default_packet_id(Utc::now().date_naive())
    };
    let envelope = Envelope::builder(FeedTopic::DriftSignal, payload, envelope_packet_id, producer)
        .with_classification(classification)
        .with_human_id(drift_id.clone())
        .with_subtype("process_gap")
        .build();

    match publisher.publish(FeedTopic::DriftSignal, &envelope) {
        Ok(_) => {
            info!(drift_id = %drift_id, packet_id = %packet_id, "Process-gap drift emitted");
            Some(drift_id)
        }
        Err(e) => {
            error!(drift_id = %drift_id, packet_id = %packet_id, error = %e, "Failed to emit process-gap drift");
            None
        }
    }
}
