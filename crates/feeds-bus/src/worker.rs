//! # Async Worker
//!
//! Drives a [`Subscriber`] from a tokio application.
//!
//! `poll` is synchronous file I/O, so each pass runs on the blocking pool.
//! The subscriber and handler are moved into the pass and handed back when
//! it completes; between passes the worker sleeps for the poll interval or
//! until shutdown is signalled, whichever comes first.

use crate::error::{BusError, BusResult};
use crate::ports::FileSystemAdapter;
use crate::subscriber::Subscriber;
use crate::DEFAULT_BATCH_SIZE;
use feeds_types::Envelope;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Pacing of a worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Totals accumulated over a worker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTotals {
    pub passes: u64,
    pub acked: usize,
    pub dead_lettered: usize,
}

/// Poll `subscriber` until `shutdown` becomes `true` or its sender is
/// dropped.
///
/// A pass that finds a full batch is followed immediately by another; the
/// worker only sleeps once the inbox is drained.
///
/// # Errors
///
/// Returns the first pass error (inbox missing or unlistable), or
/// [`BusError::Worker`] if a pass panicked outside the handler.
pub async fn run_worker<FS, F>(
    subscriber: Subscriber<FS>,
    handler: F,
    config: WorkerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> BusResult<WorkerTotals>
where
    FS: FileSystemAdapter + 'static,
    F: FnMut(&Envelope) -> anyhow::Result<()> + Send + 'static,
{
    let topic = subscriber.topic();
    let mut totals = WorkerTotals::default();
    let mut state = Some((subscriber, handler));
    info!(topic = %topic, batch_size = config.batch_size, "Worker started");

    while !*shutdown.borrow() {
        let Some((subscriber, mut handler)) = state.take() else {
            break;
        };
        let (subscriber, handler, result) = tokio::task::spawn_blocking(move || {
            let result = subscriber.poll_report(&mut handler, config.batch_size);
            (subscriber, handler, result)
        })
        .await
        .map_err(|e| BusError::Worker {
            reason: e.to_string(),
        })?;
        state = Some((subscriber, handler));

        let report = result?;
        totals.passes += 1;
        totals.acked += report.acked;
        totals.dead_lettered += report.dead_lettered;
        debug!(topic = %topic, acked = report.acked, dead_lettered = report.dead_lettered, "Worker pass complete");

        if report.claimed >= config.batch_size && config.batch_size > 0 {
            continue;
        }
        tokio::select! {
            () = tokio::time::sleep(config.poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(topic = %topic, passes = totals.passes, acked = totals.acked, "Worker stopped");
    Ok(totals)
}
