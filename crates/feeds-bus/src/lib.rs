//! # FEEDS Bus - Filesystem Event Bus
//!
//! Durable at-least-once delivery of [`Envelope`]s between independent
//! producer and consumer processes, with no broker: the directory tree is
//! the queue.
//!
//! ## On-Disk Contract
//!
//! ```text
//! <topics_root>/
//! └── <topic>/
//!     ├── inbox/        published, not yet claimed
//!     ├── processing/   claimed by exactly one consumer
//!     ├── ack/          handled successfully
//!     └── dlq/          failed; <eventId>.error.json sits beside each file
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!   publish ──▶ inbox ──claim──▶ processing ──ok──▶ ack
//!                 ▲                  │
//!                 │                  └──fail──▶ dlq
//!                 └──────── replay ─────────────┘
//! ```
//!
//! Every arrow is one `rename(2)` on the same volume. The claim rename is the
//! only contention point between consumers; the loser sees `NotFound` and
//! skips the file.
//!
//! [`Envelope`]: feeds_types::Envelope

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod dlq;
pub mod error;
pub mod layout;
pub mod ports;
pub mod publisher;
pub mod subscriber;
pub mod worker;

pub use adapters::StdFileSystem;
#[cfg(any(test, feature = "test-utils"))]
pub use adapters::FailingFileSystem;
pub use dlq::{DeadLetterManager, DeadLetterRecord};
pub use error::{BusError, BusResult};
pub use layout::{init_topic_layout, Lifecycle, QueueDepths, TopicLayout};
pub use ports::FileSystemAdapter;
pub use publisher::Publisher;
pub use subscriber::{PollReport, Subscriber};
pub use worker::{run_worker, WorkerConfig, WorkerTotals};

/// Suffix of the diagnostics file written beside a dead-lettered envelope.
pub const ERROR_SUFFIX: &str = ".error.json";

/// Prefix of in-flight temp files; never matched by consumers.
pub const TEMP_PREFIX: &str = ".tmp_";

/// Envelopes claimed per `poll` pass when the caller has no preference.
pub const DEFAULT_BATCH_SIZE: usize = 10;
