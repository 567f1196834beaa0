//! # Triage Store
//!
//! Durable record of every drift signal and where it stands in the triage
//! lifecycle.
//!
//! ## Storage
//!
//! One JSON document holding all entries. Every operation runs a full
//! cycle under the store lock:
//!
//! ```text
//! lock ──▶ load document ──▶ mutate ──▶ write temp + fsync ──▶ rename ──▶ unlock
//! ```
//!
//! so any number of processes can share one store file, and a crash leaves
//! either the old or the new document, never a torn one.

use crate::error::{TriageError, TriageResult};
use crate::lock::{lock_path, StoreLock};
use crate::state::TriageState;
use chrono::{DateTime, Utc};
use feeds_types::{Envelope, FeedTopic, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Entries returned by [`TriageStore::list`] when the caller has no limit.
pub const DEFAULT_LIST_LIMIT: usize = 50;

const DOCUMENT_VERSION: u32 = 1;

/// One triaged drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageEntry {
    pub drift_id: String,
    pub state: TriageState,
    pub severity: Severity,
    /// Drift type as reported; kept verbatim.
    pub drift_type: String,
    /// Packet the drift arrived in; empty for bare payloads.
    pub packet_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Drift notes followed by one line per transition note.
    pub notes: String,
    /// The drift payload as ingested.
    pub data: Value,
}

/// Counts across the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageStats {
    pub by_state: BTreeMap<TriageState, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    entries: BTreeMap<String, TriageEntry>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Handle on a triage store file. Cheap to clone; holds only paths.
#[derive(Debug, Clone)]
pub struct TriageStore {
    path: PathBuf,
    lock: PathBuf,
}

impl TriageStore {
    /// Open (creating if needed) the store at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the parent directory cannot be created or an existing
    /// document cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> TriageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TriageError::io(parent, e))?;
        }
        let store = Self {
            lock: lock_path(&path),
            path,
        };
        let _guard = StoreLock::shared(&store.lock)?;
        store.load()?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a drift envelope as a `NEW` entry.
    ///
    /// An existing entry with the same drift id is replaced and starts the
    /// lifecycle over.
    ///
    /// # Errors
    ///
    /// [`TriageError::InvalidDrift`] if the envelope is not a drift signal
    /// or carries no `driftId`.
    pub fn ingest_drift(&self, envelope: &Envelope) -> TriageResult<TriageEntry> {
        if envelope.topic != FeedTopic::DriftSignal {
            return Err(TriageError::InvalidDrift {
                reason: format!("expected a drift_signal envelope, got {}", envelope.topic),
            });
        }
        self.insert_new(&envelope.payload, &envelope.packet_id)
    }

    /// Register a raw drift record, either a full envelope or a bare
    /// `drift_signal` payload.
    ///
    /// # Errors
    ///
    /// Same as [`TriageStore::ingest_drift`].
    pub fn ingest_drift_value(&self, record: &Value) -> TriageResult<TriageEntry> {
        let payload = record.get("payload").unwrap_or(record);
        let packet_id = record
            .get("packetId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.insert_new(payload, packet_id)
    }

    fn insert_new(&self, payload: &Value, packet_id: &str) -> TriageResult<TriageEntry> {
        let drift_id = payload
            .get("driftId")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| TriageError::InvalidDrift {
                reason: "missing driftId".into(),
            })?;
        let severity = match payload.get("severity") {
            None | Some(Value::Null) => Severity::Yellow,
            Some(raw) => Severity::deserialize(raw).map_err(|e| TriageError::InvalidDrift {
                reason: format!("severity: {e}"),
            })?,
        };
        let text = |field: &str| {
            payload
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let now = Utc::now();
        let entry = TriageEntry {
            drift_id: drift_id.to_string(),
            state: TriageState::New,
            severity,
            drift_type: text("driftType"),
            packet_id: packet_id.to_string(),
            created_at: now,
            updated_at: now,
            notes: text("notes"),
            data: payload.clone(),
        };

        self.modify(|doc| {
            doc.entries.insert(entry.drift_id.clone(), entry.clone());
            Ok(())
        })?;
        info!(drift_id = %entry.drift_id, severity = entry.severity.as_str(), "Drift registered for triage");
        Ok(entry)
    }

    /// Move `drift_id` to `new_state`, appending `notes` if given.
    ///
    /// # Errors
    ///
    /// - [`TriageError::NotFound`] if no entry exists
    /// - [`TriageError::InvalidTransition`] if `new_state` is not the
    ///   current state's successor; the entry is left unchanged
    pub fn set_state(
        &self,
        drift_id: &str,
        new_state: TriageState,
        notes: Option<&str>,
    ) -> TriageResult<TriageEntry> {
        let entry = self.modify(|doc| {
            let entry = doc
                .entries
                .get_mut(drift_id)
                .ok_or_else(|| TriageError::NotFound {
                    drift_id: drift_id.to_string(),
                })?;
            if !entry.state.can_transition_to(new_state) {
                return Err(TriageError::InvalidTransition {
                    from: entry.state,
                    to: new_state,
                });
            }

            entry.state = new_state;
            entry.updated_at = Utc::now();
            if let Some(note) = notes.map(str::trim).filter(|n| !n.is_empty()) {
                if entry.notes.is_empty() {
                    entry.notes = note.to_string();
                } else {
                    entry.notes.push('\n');
                    entry.notes.push_str(note);
                }
            }
            Ok(entry.clone())
        })?;

        info!(drift_id = %drift_id, state = %new_state, "Triage state changed");
        Ok(entry)
    }

    /// Look up one entry.
    ///
    /// # Errors
    ///
    /// Fails only if the store cannot be read.
    pub fn get(&self, drift_id: &str) -> TriageResult<Option<TriageEntry>> {
        let _guard = StoreLock::shared(&self.lock)?;
        Ok(self.load()?.entries.remove(drift_id))
    }

    /// Entries, most recently updated first, optionally filtered by state.
    ///
    /// # Errors
    ///
    /// Fails only if the store cannot be read.
    pub fn list(&self, state: Option<TriageState>, limit: usize) -> TriageResult<Vec<TriageEntry>> {
        let _guard = StoreLock::shared(&self.lock)?;
        let mut entries: Vec<TriageEntry> = self
            .load()?
            .entries
            .into_values()
            .filter(|entry| state.is_none_or(|s| entry.state == s))
            .collect();
        entries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.drift_id.cmp(&b.drift_id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Counts by state and by severity.
    ///
    /// # Errors
    ///
    /// Fails only if the store cannot be read.
    pub fn stats(&self) -> TriageResult<TriageStats> {
        let _guard = StoreLock::shared(&self.lock)?;
        let doc = self.load()?;
        let mut stats = TriageStats {
            total: doc.entries.len(),
            ..TriageStats::default()
        };
        for entry in doc.entries.values() {
            *stats.by_state.entry(entry.state).or_default() += 1;
            *stats.by_severity.entry(entry.severity).or_default() += 1;
        }
        Ok(stats)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Load, apply `f`, and save if `f` succeeds, all under the exclusive
    /// lock.
    fn modify<T>(&self, f: impl FnOnce(&mut Document) -> TriageResult<T>) -> TriageResult<T> {
        let _guard = StoreLock::exclusive(&self.lock)?;
        let mut doc = self.load()?;
        let out = f(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }

    fn load(&self) -> TriageResult<Document> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(TriageError::Corrupt),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(TriageError::io(&self.path, e)),
        }
    }

    fn save(&self, doc: &Document) -> TriageResult<()> {
        let bytes = encode(doc)?;
        let temp = self
            .path
            .with_extension(format!("tmp-{}", Uuid::new_v4().simple()));

        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(TriageError::io(&self.path, e));
        }
        debug!(path = %self.path.display(), entries = doc.entries.len(), "Triage store saved");
        Ok(())
    }
}

fn encode<T: Serialize>(doc: &T) -> TriageResult<Vec<u8>> {
    serde_json::to_vec_pretty(doc).map_err(TriageError::Encode)
}
