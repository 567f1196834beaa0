//! # Envelope Validation
//!
//! Three checks, in order:
//!
//! 1. **Envelope shape**: required fields, types, closed vocabularies, id and
//!    hash formats, topic/record type agreement.
//! 2. **Payload shape**: the payload against its topic's typed shape.
//! 3. **Hash equality**: `payloadHash` against the digest recomputed from
//!    `payload`.
//!
//! Phase 1 short-circuits: if the envelope itself is malformed the payload
//! is never inspected. Phases 2 and 3 both run once phase 1 passes.

use crate::envelope::Envelope;
use crate::hashing::{compute_payload_hash, is_payload_hash};
use crate::payloads::TopicPayload;
use crate::topic::{Classification, FeedTopic, RecordType};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One reason an envelope is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The record is not a JSON object at all.
    #[error("Envelope is not a JSON object")]
    NotAnObject,

    /// A required envelope field is absent or null.
    #[error("Missing required field `{field}`")]
    MissingField { field: &'static str },

    /// An envelope field is present but malformed.
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// `recordType` does not correspond to `topic`.
    #[error("Record type {record_type} does not match topic {topic}")]
    RecordTypeMismatch {
        topic: FeedTopic,
        record_type: RecordType,
    },

    /// The payload does not have the shape its topic requires.
    #[error("Invalid {topic} payload: {reason}")]
    PayloadShape { topic: FeedTopic, reason: String },

    /// The declared payload hash differs from the recomputed one.
    #[error("Payload hash mismatch: declared {declared}, computed {computed}")]
    HashMismatch { declared: String, computed: String },
}

impl ValidationError {
    /// Whether this error came from the envelope-shape phase.
    #[must_use]
    pub fn is_envelope_shape(&self) -> bool {
        !matches!(
            self,
            ValidationError::PayloadShape { .. } | ValidationError::HashMismatch { .. }
        )
    }
}

#[derive(Clone, Copy)]
enum Kind {
    String,
    UnsignedInt,
    Object,
}

const REQUIRED_FIELDS: [(&str, Kind); 12] = [
    ("eventId", Kind::String),
    ("packetId", Kind::String),
    ("topic", Kind::String),
    ("recordType", Kind::String),
    ("uid", Kind::String),
    ("sequence", Kind::UnsignedInt),
    ("createdAt", Kind::String),
    ("producer", Kind::String),
    ("classification", Kind::String),
    ("payload", Kind::Object),
    ("payloadHash", Kind::String),
    ("schemaVersion", Kind::String),
];

/// Validate a typed envelope.
///
/// Returns every violation found; an empty vector means the envelope is valid.
#[must_use]
pub fn validate(envelope: &Envelope) -> Vec<ValidationError> {
    match serde_json::to_value(envelope) {
        Ok(raw) => validate_value(&raw),
        Err(e) => vec![ValidationError::InvalidField {
            field: "envelope",
            reason: e.to_string(),
        }],
    }
}

/// Validate a raw JSON record as an envelope.
///
/// Returns every violation found; an empty vector means the record is a
/// valid envelope.
#[must_use]
pub fn validate_value(raw: &Value) -> Vec<ValidationError> {
    let shape_errors = check_envelope_shape(raw);
    if !shape_errors.is_empty() {
        return shape_errors;
    }

    let envelope = match Envelope::deserialize(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            return vec![ValidationError::InvalidField {
                field: "envelope",
                reason: e.to_string(),
            }]
        }
    };

    let mut errors = Vec::new();
    match TopicPayload::parse(envelope.topic, &envelope.payload) {
        Ok(parsed) => errors.extend(parsed.violations().into_iter().map(|reason| {
            ValidationError::PayloadShape {
                topic: envelope.topic,
                reason,
            }
        })),
        Err(reason) => errors.push(ValidationError::PayloadShape {
            topic: envelope.topic,
            reason,
        }),
    }

    let computed = compute_payload_hash(&envelope.payload);
    if computed != envelope.payload_hash {
        errors.push(ValidationError::HashMismatch {
            declared: envelope.payload_hash,
            computed,
        });
    }
    errors
}

fn check_envelope_shape(raw: &Value) -> Vec<ValidationError> {
    let Some(obj) = raw.as_object() else {
        return vec![ValidationError::NotAnObject];
    };

    let mut errors = Vec::new();
    for (field, kind) in REQUIRED_FIELDS {
        match obj.get(field) {
            None | Some(Value::Null) => errors.push(ValidationError::MissingField { field }),
            Some(value) => {
                let ok = match kind {
                    Kind::String => value.is_string(),
                    Kind::UnsignedInt => value.is_u64(),
                    Kind::Object => value.is_object(),
                };
                if !ok {
                    errors.push(ValidationError::InvalidField {
                        field,
                        reason: format!("expected {}", kind_name(kind)),
                    });
                }
            }
        }
    }
    if !errors.is_empty() {
        return errors;
    }

    let text = |field: &str| obj.get(field).and_then(Value::as_str).unwrap_or_default();

    for field in ["eventId", "uid", "producer", "schemaVersion"] {
        if text(field).trim().is_empty() {
            errors.push(ValidationError::InvalidField {
                field: static_name(field),
                reason: "must not be empty".into(),
            });
        }
    }

    let event_id = text("eventId");
    if !event_id.trim().is_empty() && !is_event_id(event_id) {
        errors.push(ValidationError::InvalidField {
            field: "eventId",
            reason: format!("not usable as an envelope file name: {event_id:?}"),
        });
    }

    let topic = text("topic").parse::<FeedTopic>();
    if let Err(e) = &topic {
        errors.push(ValidationError::InvalidField {
            field: "topic",
            reason: e.to_string(),
        });
    }
    let record_type = text("recordType").parse::<RecordType>();
    if let Err(e) = &record_type {
        errors.push(ValidationError::InvalidField {
            field: "recordType",
            reason: e.to_string(),
        });
    }
    if let (Ok(topic), Ok(record_type)) = (topic, record_type) {
        if topic.record_type() != record_type {
            errors.push(ValidationError::RecordTypeMismatch { topic, record_type });
        }
    }

    if let Err(e) = text("classification").parse::<Classification>() {
        errors.push(ValidationError::InvalidField {
            field: "classification",
            reason: e.to_string(),
        });
    }
    if DateTime::parse_from_rfc3339(text("createdAt")).is_err() {
        errors.push(ValidationError::InvalidField {
            field: "createdAt",
            reason: "expected an RFC 3339 timestamp".into(),
        });
    }
    if !is_packet_id(text("packetId")) {
        errors.push(ValidationError::InvalidField {
            field: "packetId",
            reason: format!("expected CP-YYYY-MM-DD-NNNN, got {}", text("packetId")),
        });
    }
    if !is_payload_hash(text("payloadHash")) {
        errors.push(ValidationError::InvalidField {
            field: "payloadHash",
            reason: "expected sha256:<64 lowercase hex>".into(),
        });
    }
    errors
}

/// Whether `s` can name an envelope file as `<s>.json` inside a topic folder.
///
/// Rejects path separators, `..`, control characters, a leading dot (temp
/// files are hidden that way) and a `.error` suffix (reserved for dlq
/// diagnostics).
#[must_use]
pub fn is_event_id(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with(".error")
        && !s.contains("..")
        && !s.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Whether `s` is a packet identifier of the form `CP-YYYY-MM-DD-NNNN`
/// (four or more trailing digits).
#[must_use]
pub fn is_packet_id(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("CP-") else {
        return false;
    };
    if !rest.is_ascii() || rest.len() < 15 {
        return false;
    }
    let (date, counter) = rest.split_at(10);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
        && counter
            .strip_prefix('-')
            .is_some_and(|digits| digits.len() >= 4 && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn kind_name(kind: Kind) -> &'static str {
    match kind {
        Kind::String => "a string",
        Kind::UnsignedInt => "a non-negative integer",
        Kind::Object => "an object",
    }
}

fn static_name(field: &str) -> &'static str {
    REQUIRED_FIELDS
        .iter()
        .map(|(name, _)| *name)
        .find(|name| *name == field)
        .unwrap_or("envelope")
}
