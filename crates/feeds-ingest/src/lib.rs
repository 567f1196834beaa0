//! # FEEDS Ingest
//!
//! Manifest-first ingest of coherence packets onto the bus.
//!
//! A packet is a directory holding `manifest.json` plus one `<topic>.json`
//! artifact per topic. Ingest either lands every envelope of the packet in
//! its topic inbox, or lands none of them and reports why (emitting a
//! `process_gap` drift signal when the packet is identifiable).
//!
//! ```text
//! packet/                                topics_root/
//! ├── manifest.json   ──VERIFY──┐        ├── packet_index/inbox/   seq 0
//! ├── truth_snapshot.json       ├─EXTRACT┼── truth_snapshot/inbox/ seq 1
//! └── canon_entry.json          ┘  STAGE └── canon_entry/inbox/    seq 2
//!                                  COMMIT
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod diagnostics;
pub mod error;
pub mod extractors;
pub mod manifest;
pub mod orchestrator;

pub use diagnostics::emit_process_gap;
pub use error::IngestError;
pub use manifest::{ArtifactDecl, Manifest, MANIFEST_FILE};
pub use orchestrator::{IngestOrchestrator, IngestReport, DEFAULT_PRODUCER};
