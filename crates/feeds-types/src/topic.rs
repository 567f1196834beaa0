//! # Topic Catalogue
//!
//! The closed set of FEEDS topics, their 1:1 record type codes, and the
//! sensitivity tiers an envelope can carry.
//!
//! Adding a topic means adding a variant here; every `match` over
//! [`FeedTopic`] (extractors, payload shapes, layout) then fails to compile
//! until the new topic is handled.

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event topics routed by the bus.
///
/// Each topic owns a directory subtree `<topics_root>/<topic>/` with the four
/// lifecycle folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedTopic {
    /// Sealed snapshot of claims and their evidence.
    TruthSnapshot,
    /// Authority grant: which claims a role has blessed.
    AuthoritySlice,
    /// Decision record with its claim lineage.
    DecisionLineage,
    /// A detected inconsistency.
    DriftSignal,
    /// Versioned canon update.
    CanonEntry,
    /// Packet manifest: the index of every artifact in one ingest packet.
    PacketIndex,
}

impl FeedTopic {
    /// Every topic, in catalogue order.
    pub const ALL: [FeedTopic; 6] = [
        FeedTopic::TruthSnapshot,
        FeedTopic::AuthoritySlice,
        FeedTopic::DecisionLineage,
        FeedTopic::DriftSignal,
        FeedTopic::CanonEntry,
        FeedTopic::PacketIndex,
    ];

    /// Topics carried by artifact files inside a packet (everything except
    /// the packet index, which is derived from the manifest).
    pub const ARTIFACTS: [FeedTopic; 5] = [
        FeedTopic::TruthSnapshot,
        FeedTopic::AuthoritySlice,
        FeedTopic::DecisionLineage,
        FeedTopic::DriftSignal,
        FeedTopic::CanonEntry,
    ];

    /// Directory and wire name of the topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FeedTopic::TruthSnapshot => "truth_snapshot",
            FeedTopic::AuthoritySlice => "authority_slice",
            FeedTopic::DecisionLineage => "decision_lineage",
            FeedTopic::DriftSignal => "drift_signal",
            FeedTopic::CanonEntry => "canon_entry",
            FeedTopic::PacketIndex => "packet_index",
        }
    }

    /// Record type code stamped into every envelope of this topic.
    #[must_use]
    pub const fn record_type(self) -> RecordType {
        match self {
            FeedTopic::TruthSnapshot => RecordType::Ts,
            FeedTopic::AuthoritySlice => RecordType::Als,
            FeedTopic::DecisionLineage => RecordType::Dlr,
            FeedTopic::DriftSignal => RecordType::Ds,
            FeedTopic::CanonEntry => RecordType::Ce,
            FeedTopic::PacketIndex => RecordType::Manifest,
        }
    }

    /// Conventional artifact file name inside a packet directory.
    #[must_use]
    pub fn artifact_file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for FeedTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedTopic {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedTopic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| ParseError::UnknownTopic(s.to_string()))
    }
}

/// Short record type code, derived 1:1 from the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "TS")]
    Ts,
    #[serde(rename = "ALS")]
    Als,
    #[serde(rename = "DLR")]
    Dlr,
    #[serde(rename = "DS")]
    Ds,
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "MANIFEST")]
    Manifest,
}

impl RecordType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RecordType::Ts => "TS",
            RecordType::Als => "ALS",
            RecordType::Dlr => "DLR",
            RecordType::Ds => "DS",
            RecordType::Ce => "CE",
            RecordType::Manifest => "MANIFEST",
        }
    }

    /// The topic this record type belongs to.
    #[must_use]
    pub const fn topic(self) -> FeedTopic {
        match self {
            RecordType::Ts => FeedTopic::TruthSnapshot,
            RecordType::Als => FeedTopic::AuthoritySlice,
            RecordType::Dlr => FeedTopic::DecisionLineage,
            RecordType::Ds => FeedTopic::DriftSignal,
            RecordType::Ce => FeedTopic::CanonEntry,
            RecordType::Manifest => FeedTopic::PacketIndex,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedTopic::ALL
            .into_iter()
            .map(FeedTopic::record_type)
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| ParseError::UnknownRecordType(s.to_string()))
    }
}

/// Sensitivity tier of an envelope. `Level0` is public, `Level3` the most
/// restricted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    #[default]
    #[serde(rename = "LEVEL_0")]
    Level0,
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[serde(rename = "LEVEL_3")]
    Level3,
}

impl Classification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Classification::Level0 => "LEVEL_0",
            Classification::Level1 => "LEVEL_1",
            Classification::Level2 => "LEVEL_2",
            Classification::Level3 => "LEVEL_3",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEVEL_0" => Ok(Classification::Level0),
            "LEVEL_1" => Ok(Classification::Level1),
            "LEVEL_2" => Ok(Classification::Level2),
            "LEVEL_3" => Ok(Classification::Level3),
            other => Err(ParseError::UnknownClassification(other.to_string())),
        }
    }
}
