//! # FEEDS Types
//!
//! The canonical wire record for every governance event carried by the bus,
//! plus the closed topic catalogue it is routed by.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: topics, record types and payload shapes are
//!   defined here and nowhere else.
//! - **Content Addressing**: `payloadHash` is always recomputed from the
//!   payload by the builder; callers cannot supply one.
//! - **Two-Phase Validation**: envelope shape first, payload shape second.
//!   A malformed envelope never reaches payload validation.
//!
//! ## Envelope Layout
//!
//! ```text
//! ┌──────────────────────── Envelope ────────────────────────┐
//! │ eventId  packetId  topic  recordType  uid  sequence      │
//! │ createdAt  producer  classification  schemaVersion       │
//! │ [humanId]  [subtype]                                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ payload ──canonical JSON──▶ SHA-256 ──▶ payloadHash      │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod envelope;
pub mod errors;
pub mod hashing;
pub mod payloads;
pub mod topic;
pub mod validation;

pub use envelope::{Envelope, EnvelopeBuilder, SCHEMA_VERSION};
pub use errors::ParseError;
pub use hashing::{canonical_json, compute_payload_hash, is_payload_hash, HASH_PREFIX};
pub use payloads::{
    ArtifactRef, CanonEntry, DecisionLineage, DriftSignal, DriftType, Fingerprint, Outcome,
    PacketIndex, Seal, Severity, TopicPayload, TruthSnapshot, AuthoritySlice,
};
pub use topic::{Classification, FeedTopic, RecordType};
pub use validation::{is_event_id, is_packet_id, validate, validate_value, ValidationError};
