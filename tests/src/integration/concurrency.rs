//! # Competing Consumers
//!
//! N workers poll one topic concurrently. Every event must end in exactly
//! one of `ack` or `dlq`, handled by exactly one worker.

use super::fixtures::*;
use feeds_bus::{run_worker, PollReport, Publisher, Subscriber, TopicLayout, WorkerConfig};
use feeds_types::FeedTopic;
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::watch;

const WORKERS: usize = 6;
const EVENTS: usize = 120;

fn publish_drifts(root: &std::path::Path, count: usize) -> HashSet<String> {
    let publisher = Publisher::new(root);
    (0..count)
        .map(|i| {
            let env = drift_envelope(&format!("DS-race-{i:04}"));
            publisher.publish(FeedTopic::DriftSignal, &env).unwrap();
            env.event_id
        })
        .collect()
}

#[test]
fn test_competing_workers_partition_events() {
    let scratch = Scratch::new();
    let published = publish_drifts(&scratch.root, EVENTS);

    let handled = Arc::new(Mutex::new(Vec::<String>::new()));
    let barrier = Arc::new(Barrier::new(WORKERS));

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let root = scratch.root.clone();
            let handled = Arc::clone(&handled);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let subscriber = Subscriber::new(root, FeedTopic::DriftSignal);
                let mut totals = PollReport::default();
                barrier.wait();
                loop {
                    let report = subscriber
                        .poll_report(
                            |env| {
                                handled.lock().unwrap().push(env.event_id.clone());
                                // Every third drift fails so both outcomes race.
                                let n: usize = env.payload["driftId"]
                                    .as_str()
                                    .and_then(|id| id.rsplit('-').next())
                                    .and_then(|n| n.parse().ok())
                                    .unwrap_or(0);
                                if n % 3 == 0 {
                                    anyhow::bail!("rejected {n}");
                                }
                                Ok(())
                            },
                            4,
                        )
                        .unwrap();
                    totals.claimed += report.claimed;
                    totals.acked += report.acked;
                    totals.dead_lettered += report.dead_lettered;
                    if report.claimed == 0 && subscriber.list_inbox(1).unwrap().is_empty() {
                        break totals;
                    }
                }
            })
        })
        .collect();

    let totals: Vec<PollReport> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let acked: usize = totals.iter().map(|t| t.acked).sum();
    let dead: usize = totals.iter().map(|t| t.dead_lettered).sum();
    assert_eq!(acked + dead, EVENTS);
    assert_eq!(dead, EVENTS.div_ceil(3));

    let handled = handled.lock().unwrap();
    assert_eq!(handled.len(), EVENTS, "an event was handled twice");
    let unique: HashSet<String> = handled.iter().cloned().collect();
    assert_eq!(unique, published);

    let layout = TopicLayout::new(&scratch.root);
    let depths = layout.depths(FeedTopic::DriftSignal).unwrap();
    assert_eq!(depths.inbox, 0);
    assert_eq!(depths.processing, 0);
    assert_eq!(depths.ack + depths.dlq, EVENTS);
    assert_eq!(depths.dlq, dead);

    let acked_ids: HashSet<String> = read_envelopes(&layout.ack(FeedTopic::DriftSignal))
        .into_iter()
        .map(|e| e.event_id)
        .collect();
    let dead_ids: HashSet<String> = read_envelopes(&layout.dlq(FeedTopic::DriftSignal))
        .into_iter()
        .map(|e| e.event_id)
        .collect();
    assert!(acked_ids.is_disjoint(&dead_ids));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_workers_drain_shared_inbox() {
    let scratch = Scratch::new();
    publish_drifts(&scratch.root, 40);

    let (tx, rx) = watch::channel(false);
    let config = WorkerConfig {
        batch_size: 5,
        poll_interval: Duration::from_millis(10),
    };
    let handles: Vec<_> = (0..3)
        .map(|_| {
            tokio::spawn(run_worker(
                Subscriber::new(scratch.root.clone(), FeedTopic::DriftSignal),
                |_: &feeds_types::Envelope| Ok(()),
                config,
                rx.clone(),
            ))
        })
        .collect();

    let layout = TopicLayout::new(&scratch.root);
    for _ in 0..200 {
        if layout.depths(FeedTopic::DriftSignal).unwrap().ack == 40 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tx.send(true).unwrap();

    let mut acked = 0;
    for handle in handles {
        acked += handle.await.unwrap().unwrap().acked;
    }
    assert_eq!(acked, 40);
    assert_eq!(layout.depths(FeedTopic::DriftSignal).unwrap().ack, 40);
}
