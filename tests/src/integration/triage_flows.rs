//! # Triage Flows
//!
//! ```text
//! ingest failure ──▶ drift_signal/inbox ──Subscriber + drift_handler──▶ TriageStore
//! ```

use super::fixtures::*;
use feeds_bus::{run_worker, DeadLetterManager, Publisher, Subscriber, TopicLayout};
use feeds_ingest::IngestOrchestrator;
use feeds_telemetry::FeedsConfig;
use feeds_triage::{drift_handler, TriageError, TriageState, TriageStore, DEFAULT_LIST_LIMIT};
use feeds_types::{FeedTopic, Severity};
use std::fs;
use std::time::Duration;
use tokio::sync::watch;

#[test]
fn test_process_gap_drift_walks_full_lifecycle() {
    let scratch = Scratch::new();
    let packet = scratch.packet_dir("broken");
    full_packet(&packet);
    fs::remove_file(packet.join("authority_slice.json")).unwrap();

    let report = IngestOrchestrator::new(&scratch.root).ingest(&packet);
    assert!(!report.success);
    let drift_id = report.drift_signal_id.unwrap();

    let store = TriageStore::open(scratch.triage_store_path()).unwrap();
    let acked = Subscriber::new(&scratch.root, FeedTopic::DriftSignal)
        .poll(drift_handler(store.clone()), 10)
        .unwrap();
    assert_eq!(acked, 1);

    let entry = store.get(&drift_id).unwrap().unwrap();
    assert_eq!(entry.state, TriageState::New);
    assert_eq!(entry.severity, Severity::Red);
    assert_eq!(entry.drift_type, "process_gap");
    assert_eq!(entry.packet_id, PACKET_ID);
    assert!(entry.notes.contains("authority_slice.json"));

    let err = store
        .set_state(&drift_id, TriageState::Verified, None)
        .unwrap_err();
    assert!(matches!(err, TriageError::InvalidTransition { .. }));
    assert_eq!(store.get(&drift_id).unwrap().unwrap().state, TriageState::New);

    for (state, note) in [
        (TriageState::Triaged, "packet producer notified"),
        (TriageState::PatchPlanned, "add artifact presence check upstream"),
        (TriageState::Patched, "check deployed"),
        (TriageState::Verified, "re-ingest clean"),
    ] {
        store.set_state(&drift_id, state, Some(note)).unwrap();
    }
    let verified = store.get(&drift_id).unwrap().unwrap();
    assert_eq!(verified.state, TriageState::Verified);
    assert!(verified.notes.ends_with("check deployed\nre-ingest clean"));

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.by_state[&TriageState::Verified], 1);
}

#[test]
fn test_non_drift_topic_dead_letters_through_handler() {
    let scratch = Scratch::new();
    let topic = FeedTopic::CanonEntry;
    Publisher::new(&scratch.root)
        .publish(topic, &envelope(topic, canon_entry("CANON-misrouted")))
        .unwrap();

    let store = TriageStore::open(scratch.triage_store_path()).unwrap();
    let acked = Subscriber::new(&scratch.root, topic)
        .poll(drift_handler(store.clone()), 10)
        .unwrap();
    assert_eq!(acked, 0);
    assert_eq!(store.stats().unwrap().total, 0);

    let dlq = DeadLetterManager::new(&scratch.root, topic);
    let dead = dlq.list_events().unwrap();
    assert_eq!(dead.len(), 1);
}

#[test]
fn test_store_shared_between_handles() {
    let scratch = Scratch::new();
    let publisher = Publisher::new(&scratch.root);
    for id in ["DS-a", "DS-b", "DS-c"] {
        publisher
            .publish(FeedTopic::DriftSignal, &drift_envelope(id))
            .unwrap();
    }

    let consumer_side = TriageStore::open(scratch.triage_store_path()).unwrap();
    Subscriber::new(&scratch.root, FeedTopic::DriftSignal)
        .poll(drift_handler(consumer_side), 10)
        .unwrap();

    let operator_side = TriageStore::open(scratch.triage_store_path()).unwrap();
    operator_side
        .set_state("DS-b", TriageState::Triaged, Some("assigned"))
        .unwrap();

    let new = operator_side
        .list(Some(TriageState::New), DEFAULT_LIST_LIMIT)
        .unwrap();
    let mut new_ids: Vec<_> = new.iter().map(|e| e.drift_id.as_str()).collect();
    new_ids.sort_unstable();
    assert_eq!(new_ids, vec!["DS-a", "DS-c"]);

    let recent = operator_side.list(None, 1).unwrap();
    assert_eq!(recent[0].drift_id, "DS-b");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_feeds_triage_until_shutdown() {
    let scratch = Scratch::new();
    let config = FeedsConfig {
        topics_root: scratch.root.clone(),
        batch_size: 4,
        poll_interval: Duration::from_millis(10),
        triage_store: scratch.triage_store_path(),
        ..FeedsConfig::default()
    };

    let store = TriageStore::open(&config.triage_store).unwrap();
    let (tx, rx) = watch::channel(false);
    let worker = tokio::spawn(run_worker(
        Subscriber::new(config.topics_root.clone(), FeedTopic::DriftSignal),
        drift_handler(store.clone()),
        config.worker_config(),
        rx,
    ));

    let publisher = Publisher::new(&config.topics_root);
    for i in 0..10 {
        publisher
            .publish(FeedTopic::DriftSignal, &drift_envelope(&format!("DS-w-{i}")))
            .unwrap();
    }

    for _ in 0..300 {
        if store.stats().unwrap().total == 10 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tx.send(true).unwrap();

    let totals = worker.await.unwrap().unwrap();
    assert_eq!(totals.acked, 10);
    assert_eq!(totals.dead_lettered, 0);
    assert_eq!(store.stats().unwrap().by_state[&TriageState::New], 10);
    assert_eq!(
        TopicLayout::new(&config.topics_root)
            .depths(FeedTopic::DriftSignal)
            .unwrap()
            .ack,
        10
    );
}
