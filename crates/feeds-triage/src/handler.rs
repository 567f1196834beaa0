//! Bus handler that feeds `drift_signal` events into a [`TriageStore`].

use crate::store::TriageStore;
use anyhow::{bail, Context};
use feeds_types::{Envelope, FeedTopic};
use tracing::debug;

/// Subscriber handler registering every consumed drift as a `NEW` entry.
///
/// Non-drift envelopes are rejected, so a handler wired to the wrong topic
/// dead-letters its input instead of silently acknowledging it.
pub fn drift_handler(
    store: TriageStore,
) -> impl FnMut(&Envelope) -> anyhow::Result<()> + Send + 'static {
    move |envelope: &Envelope| {
        if envelope.topic != FeedTopic::DriftSignal {
            bail!("triage only accepts drift_signal events, got {}", envelope.topic);
        }
        let entry = store
            .ingest_drift(envelope)
            .with_context(|| format!("registering drift from event {}", envelope.event_id))?;
        debug!(event_id = %envelope.event_id, drift_id = %entry.drift_id, "Drift consumed");
        Ok(())
    }
}
