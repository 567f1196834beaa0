//! # FEEDS Triage
//!
//! Tracks every drift signal from arrival to verified fix.
//!
//! ## Flow
//!
//! ```text
//! drift_signal/inbox ──Subscriber──▶ drift_handler ──▶ TriageStore (NEW)
//!                                                          │
//!                               operator: set_state ───────┘
//!                  NEW → TRIAGED → PATCH_PLANNED → PATCHED → VERIFIED
//! ```
//!
//! ## Guarantees
//!
//! - One forward step at a time; a rejected transition leaves the entry
//!   untouched.
//! - Every mutation is a locked load-modify-save of one JSON document,
//!   written via temp file, fsync and rename.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod handler;
mod lock;
pub mod state;
pub mod store;

pub use error::{TriageError, TriageResult};
pub use handler::drift_handler;
pub use state::TriageState;
pub use store::{TriageEntry, TriageStats, TriageStore, DEFAULT_LIST_LIMIT};
