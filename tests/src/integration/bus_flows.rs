//! # Bus Flows
//!
//! ```text
//! Publisher ──▶ inbox ──poll──▶ processing ──▶ ack
//!                 ▲                  └────────▶ dlq ──replay──┐
//!                 └───────────────────────────────────────────┘
//! ```

use super::fixtures::*;
use feeds_bus::{
    BusError, DeadLetterManager, FailingFileSystem, Publisher, Subscriber, TopicLayout,
};
use feeds_types::{Envelope, FeedTopic};
use std::cell::Cell;
use std::fs;

#[test]
fn test_every_topic_round_trips_to_ack() {
    let scratch = Scratch::new();
    let publisher = Publisher::new(&scratch.root);
    let layout = TopicLayout::new(&scratch.root);

    let samples = [
        (FeedTopic::TruthSnapshot, truth_snapshot("TS-bus")),
        (FeedTopic::AuthoritySlice, authority_slice("ALS-bus")),
        (FeedTopic::DecisionLineage, decision_lineage("DLR-bus")),
        (FeedTopic::DriftSignal, drift_signal("DS-bus", "green")),
        (FeedTopic::CanonEntry, canon_entry("CANON-bus")),
    ];

    for (topic, payload) in samples {
        let sent = envelope(topic, payload);
        publisher.publish(topic, &sent).unwrap();

        let mut seen = Vec::new();
        let acked = Subscriber::new(&scratch.root, topic)
            .poll(
                |env| {
                    seen.push(env.clone());
                    Ok(())
                },
                10,
            )
            .unwrap();

        assert_eq!(acked, 1, "{topic}");
        assert_eq!(seen, vec![sent.clone()], "{topic}");

        let depths = layout.depths(topic).unwrap();
        assert_eq!((depths.inbox, depths.processing, depths.ack, depths.dlq), (0, 0, 1, 0));
        assert!(layout.ack(topic).join(sent.file_name()).exists());
    }
}

#[test]
fn test_failure_dead_letters_then_replay_acks() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let sent = drift_envelope("DS-replay");
    Publisher::new(&scratch.root).publish(topic, &sent).unwrap();

    let subscriber = Subscriber::new(&scratch.root, topic);
    let acked = subscriber
        .poll(|_| anyhow::bail!("downstream unavailable"), 10)
        .unwrap();
    assert_eq!(acked, 0);

    let dlq = DeadLetterManager::new(&scratch.root, topic);
    assert_eq!(dlq.list_events().unwrap().len(), 1);
    let record = dlq.error_record(&sent.event_id).unwrap().unwrap();
    assert_eq!(record.event_id, sent.event_id);
    assert!(record.error.contains("downstream unavailable"));

    assert_eq!(dlq.replay(Some(&sent.event_id)).unwrap(), 1);
    let layout = TopicLayout::new(&scratch.root);
    assert_eq!(count_files(&layout.dlq(topic), ".json"), 0);

    assert_eq!(subscriber.poll(|_| Ok(()), 10).unwrap(), 1);
    assert_eq!(layout.depths(topic).unwrap().ack, 1);
}

#[test]
fn test_batch_size_bounds_each_pass() {
    let scratch = Scratch::new();
    let topic = FeedTopic::CanonEntry;
    let publisher = Publisher::new(&scratch.root);
    for i in 0..7 {
        publisher
            .publish(topic, &envelope(topic, canon_entry(&format!("CANON-{i}"))))
            .unwrap();
    }

    let subscriber = Subscriber::new(&scratch.root, topic);
    let calls = Cell::new(0);
    let handler = |_: &feeds_types::Envelope| {
        calls.set(calls.get() + 1);
        Ok(())
    };
    assert_eq!(subscriber.poll(handler, 3).unwrap(), 3);
    assert_eq!(subscriber.poll(handler, 3).unwrap(), 3);
    assert_eq!(subscriber.poll(handler, 3).unwrap(), 1);
    assert_eq!(subscriber.poll(handler, 3).unwrap(), 0);
    assert_eq!(calls.get(), 7);
}

#[test]
fn test_tampered_envelope_never_reaches_handler() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let path = Publisher::new(&scratch.root)
        .publish(topic, &drift_envelope("DS-tamper"))
        .unwrap();

    let mut raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    raw["payload"]["severity"] = "green".into();
    fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let report = Subscriber::new(&scratch.root, topic)
        .poll_report(|_| panic!("handler must not run"), 10)
        .unwrap();
    assert_eq!(report.claimed, 1);
    assert_eq!(report.dead_lettered, 1);

    let dlq = DeadLetterManager::new(&scratch.root, topic);
    let event_id = raw["eventId"].as_str().unwrap();
    let record = dlq.error_record(event_id).unwrap().unwrap();
    assert!(record.error.to_lowercase().contains("hash"), "{}", record.error);
}

#[test]
fn test_invalid_envelope_rejected_before_write() {
    let scratch = Scratch::new();
    let topic = FeedTopic::TruthSnapshot;
    let mut bad = truth_snapshot("TS-bad");
    bad["coherenceScore"] = 140.into();

    let err = Publisher::new(&scratch.root)
        .publish(topic, &envelope(topic, bad))
        .unwrap_err();
    assert!(matches!(err, BusError::InvalidEnvelope { .. }));
    assert_eq!(
        fs::read_dir(TopicLayout::new(&scratch.root).inbox(topic))
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn test_failed_rename_leaves_inbox_clean() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let publisher = Publisher::with_fs(&scratch.root, FailingFileSystem::new().fail_rename_at(1));

    assert!(publisher.publish(topic, &drift_envelope("DS-io")).is_err());
    assert_eq!(
        fs::read_dir(TopicLayout::new(&scratch.root).inbox(topic))
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn test_purge_empties_dead_letters() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let publisher = Publisher::new(&scratch.root);
    for i in 0..3 {
        publisher
            .publish(topic, &drift_envelope(&format!("DS-purge-{i}")))
            .unwrap();
    }
    Subscriber::new(&scratch.root, topic)
        .poll(|_| anyhow::bail!("reject all"), 10)
        .unwrap();

    let dlq = DeadLetterManager::new(&scratch.root, topic);
    assert_eq!(dlq.list_events().unwrap().len(), 3);
    // Three envelopes plus three error records.
    assert_eq!(dlq.purge().unwrap(), 6);
    assert!(dlq.list_events().unwrap().is_empty());
}

#[test]
fn test_odd_event_ids_are_rejected_everywhere() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let publisher = Publisher::new(&scratch.root);
    let layout = TopicLayout::new(&scratch.root);

    for id in ["../../escaped", "..\\escaped", "evt.error", ".evt", "nested/evt"] {
        let mut sent = drift_envelope("DS-odd");
        sent.event_id = id.to_string();
        let err = publisher.publish(topic, &sent).unwrap_err();
        assert!(matches!(err, BusError::InvalidEnvelope { .. }), "{id}");
    }
    assert_eq!(fs::read_dir(layout.inbox(topic)).unwrap().count(), 0);
    assert!(!scratch.dir.path().join("escaped.json").exists());
    assert!(!scratch.root.join("escaped.json").exists());

    let dlq = DeadLetterManager::new(&scratch.root, topic);
    assert!(matches!(
        dlq.replay(Some("../inbox/x")),
        Err(BusError::InvalidEventId(_))
    ));
}

#[test]
fn test_dotted_event_id_is_consumed() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let mut sent = drift_envelope("DS-dotted");
    sent.event_id = "evt.v2.errors".to_string();
    Publisher::new(&scratch.root).publish(topic, &sent).unwrap();

    let acked = Subscriber::new(&scratch.root, topic)
        .poll(|_| Ok(()), 10)
        .unwrap();
    assert_eq!(acked, 1);
}

#[test]
fn test_failed_write_leaves_inbox_clean() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let publisher = Publisher::with_fs(&scratch.root, FailingFileSystem::new().fail_write_at(1));

    assert!(matches!(
        publisher.publish(topic, &drift_envelope("DS-full-disk")),
        Err(BusError::Io { .. })
    ));
    assert_eq!(
        fs::read_dir(TopicLayout::new(&scratch.root).inbox(topic))
            .unwrap()
            .count(),
        0
    );

    // The next publish through the same adapter goes through.
    publisher.publish(topic, &drift_envelope("DS-retry")).unwrap();
    assert_eq!(count_files(&TopicLayout::new(&scratch.root).inbox(topic), ".json"), 1);
}

#[test]
fn test_republishing_an_event_id_is_refused() {
    let scratch = Scratch::new();
    let topic = FeedTopic::DriftSignal;
    let publisher = Publisher::new(&scratch.root);
    let first = drift_envelope("DS-original");
    publisher.publish(topic, &first).unwrap();

    let second = Envelope::builder(topic, drift_signal("DS-imposter", "red"), PACKET_ID, PRODUCER)
        .with_event_id(first.event_id.clone())
        .build();
    assert!(matches!(
        publisher.publish(topic, &second),
        Err(BusError::DuplicateEvent { .. })
    ));

    let mut seen = Vec::new();
    Subscriber::new(&scratch.root, topic)
        .poll(
            |env| {
                seen.push(env.payload["driftId"].clone());
                Ok(())
            },
            10,
        )
        .unwrap();
    assert_eq!(seen, vec![serde_json::json!("DS-original")]);
}

#[test]
fn test_envelope_dropped_in_wrong_topic_is_dead_lettered() {
    let scratch = Scratch::new();
    let layout = TopicLayout::new(&scratch.root);
    let stray = envelope(FeedTopic::CanonEntry, canon_entry("CANON-stray"));
    fs::write(
        layout.inbox(FeedTopic::DriftSignal).join(stray.file_name()),
        serde_json::to_vec(&stray).unwrap(),
    )
    .unwrap();

    let report = Subscriber::new(&scratch.root, FeedTopic::DriftSignal)
        .poll_report(|_| panic!("handler must not run"), 10)
        .unwrap();
    assert_eq!((report.acked, report.dead_lettered), (0, 1));

    let record = DeadLetterManager::new(&scratch.root, FeedTopic::DriftSignal)
        .error_record(&stray.event_id)
        .unwrap()
        .unwrap();
    assert!(record.error.contains("canon_entry"), "{}", record.error);
}
