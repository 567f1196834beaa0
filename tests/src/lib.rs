//! # FEEDS Test Suite
//!
//! Cross-crate flows exercised against a real topics tree in a temporary
//! directory.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs      # payload builders, scratch topics root
//!     ├── bus_flows.rs     # publish → poll → ack / dlq → replay
//!     ├── concurrency.rs   # N workers racing over M events
//!     ├── ingest_flows.rs  # packet → topics, rollback, process-gap drift
//!     └── triage_flows.rs  # drift inbox → triage store → lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p feeds-tests
//! cargo test -p feeds-tests integration::concurrency
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod integration;
