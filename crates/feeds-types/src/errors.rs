//! # Error Types
//!
//! Parse errors for the closed vocabularies (topic, record type,
//! classification). Envelope validation errors live in `validation`.

use thiserror::Error;

/// A string did not name a member of one of the closed vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not one of the six FEEDS topics.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Not one of the six record type codes.
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    /// Not one of `LEVEL_0` .. `LEVEL_3`.
    #[error("Unknown classification: {0}")]
    UnknownClassification(String),
}
