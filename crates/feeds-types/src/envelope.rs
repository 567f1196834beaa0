//! # Event Envelope
//!
//! The unit of transport for every FEEDS event.
//!
//! ## Integrity Properties
//!
//! - **Content Hash**: `payload_hash` is derived from `payload` by the
//!   builder; there is no way to construct an envelope with a caller-chosen
//!   hash through [`EnvelopeBuilder`].
//! - **Idempotency**: `uid` defaults to `event_id`; consumers deduplicate on it.
//! - **Immutability**: envelopes are written once and moved, never edited.

use crate::hashing::compute_payload_hash;
use crate::topic::{Classification, FeedTopic, RecordType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Envelope schema version written by this crate.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Canonical wire record for one event.
///
/// Field names serialize in camelCase; they are the on-disk contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    // =========================================================================
    // IDENTITY
    // =========================================================================
    /// Globally unique event identifier; also the file stem on disk.
    pub event_id: String,

    /// Groups the envelopes emitted by one ingest transaction.
    pub packet_id: String,

    /// Routing topic.
    pub topic: FeedTopic,

    /// Record type code, always `topic.record_type()`.
    pub record_type: RecordType,

    /// Idempotency key for consumers.
    pub uid: String,

    /// Position within the packet.
    pub sequence: u64,

    // =========================================================================
    // PROVENANCE
    // =========================================================================
    pub created_at: DateTime<Utc>,

    /// Free-text producer identity.
    pub producer: String,

    pub classification: Classification,

    // =========================================================================
    // BODY
    // =========================================================================
    /// Topic-specific structured body.
    pub payload: Value,

    /// `sha256:` digest of the canonical payload.
    pub payload_hash: String,

    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl Envelope {
    /// Start building an envelope for `topic`.
    #[must_use]
    pub fn builder(
        topic: FeedTopic,
        payload: Value,
        packet_id: impl Into<String>,
        producer: impl Into<String>,
    ) -> EnvelopeBuilder {
        EnvelopeBuilder::new(topic, payload, packet_id, producer)
    }

    /// File name of this envelope in any lifecycle folder.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.event_id)
    }

    /// Recompute the payload digest and compare it with the declared one.
    #[must_use]
    pub fn hash_matches(&self) -> bool {
        compute_payload_hash(&self.payload) == self.payload_hash
    }
}

/// Builder for [`Envelope`].
///
/// Identity and timestamp fields are generated when not supplied. Generated
/// event ids are UUIDv7, so lexical file name order follows creation order.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    topic: FeedTopic,
    payload: Value,
    packet_id: String,
    producer: String,
    classification: Classification,
    sequence: u64,
    event_id: Option<String>,
    uid: Option<String>,
    created_at: Option<DateTime<Utc>>,
    human_id: Option<String>,
    subtype: Option<String>,
}

impl EnvelopeBuilder {
    #[must_use]
    pub fn new(
        topic: FeedTopic,
        payload: Value,
        packet_id: impl Into<String>,
        producer: impl Into<String>,
    ) -> Self {
        Self {
            topic,
            payload,
            packet_id: packet_id.into(),
            producer: producer.into(),
            classification: Classification::default(),
            sequence: 0,
            event_id: None,
            uid: None,
            created_at: None,
            human_id: None,
            subtype: None,
        }
    }

    #[must_use]
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn with_human_id(mut self, human_id: impl Into<String>) -> Self {
        self.human_id = Some(human_id.into());
        self
    }

    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Finish the envelope, hashing the payload.
    #[must_use]
    pub fn build(self) -> Envelope {
        let event_id = self
            .event_id
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let uid = self.uid.unwrap_or_else(|| event_id.clone());
        let payload_hash = compute_payload_hash(&self.payload);

        Envelope {
            event_id,
            packet_id: self.packet_id,
            topic: self.topic,
            record_type: self.topic.record_type(),
            uid,
            sequence: self.sequence,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            producer: self.producer,
            classification: self.classification,
            payload: self.payload,
            payload_hash,
            schema_version: SCHEMA_VERSION.to_string(),
            human_id: self.human_id,
            subtype: self.subtype,
        }
    }
}
