//! # Packet Manifest
//!
//! `manifest.json` is read before anything else in a packet directory.
//!
//! ```json
//! {
//!   "packetId": "CP-2026-02-27-0001",
//!   "artifacts": {
//!     "truth_snapshot": { "file": "truth_snapshot.json", "hash": "sha256:..." }
//!   },
//!   "packetIndex": { ... }
//! }
//! ```
//!
//! Every field is optional. Without `artifacts`, topics are detected from
//! `<topic>.json` files present in the packet directory.

use crate::error::IngestError;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Manifest file name inside a packet directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One declared artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArtifactDecl {
    /// File name relative to the packet directory. Defaults to
    /// `<topic>.json`.
    #[serde(default)]
    pub file: Option<String>,

    /// Expected `sha256:` payload hash of the file's JSON content.
    #[serde(default)]
    pub hash: Option<String>,
}

/// Parsed `manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub packet_id: Option<String>,

    /// Declared artifacts keyed by topic name. Keys are kept as strings so
    /// an unknown topic is reported as an ingest error, not a parse error.
    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactDecl>,

    /// Explicit `packet_index` payload, used verbatim when present.
    #[serde(default)]
    pub packet_index: Option<Value>,
}

impl Manifest {
    /// Read and parse `<packet_dir>/manifest.json`.
    ///
    /// # Errors
    ///
    /// [`IngestError::ManifestMissing`] if the file does not exist,
    /// [`IngestError::ManifestInvalid`] if it cannot be read or parsed.
    pub fn load(packet_dir: &Path) -> Result<Self, IngestError> {
        let path = packet_dir.join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => IngestError::ManifestMissing {
                packet_dir: packet_dir.to_path_buf(),
            },
            _ => IngestError::ManifestInvalid {
                reason: e.to_string(),
            },
        })?;
        serde_json::from_slice(&bytes).map_err(|e| IngestError::ManifestInvalid {
            reason: e.to_string(),
        })
    }

    /// Declared packet id, or `CP-<today>-0000`.
    #[must_use]
    pub fn packet_id_or_default(&self) -> String {
        self.packet_id
            .clone()
            .unwrap_or_else(|| default_packet_id(Utc::now().date_naive()))
    }
}

/// Packet id used when a manifest declares none.
#[must_use]
pub fn default_packet_id(date: NaiveDate) -> String {
    format!("CP-{}-0000", date.format("%Y-%m-%d"))
}
