use stampede::engine::stats::{spawn_collector, OutcomeRecord};
use std::time::{Duration, SystemTime};

fn record(action: &str, millis: u64, succeeded: bool) -> OutcomeRecord {
    OutcomeRecord {
        action_name: action.to_string(),
        started_at: SystemTime::now(),
        duration: Duration::from_millis(millis),
        succeeded,
        status_code: if succeeded { Some(200) } else { None },
    }
}

#[tokio::test]
async fn concurrent_records_are_all_counted() {
    let (stats, collector) = spawn_collector();
    let actions = ["alpha", "beta", "gamma", "delta"];

    let mut handles = Vec::new();
    for i in 0..1_000 {
        let stats = stats.clone();
        let action = actions[i % actions.len()];
        handles.push(tokio::spawn(async move {
            stats.record(record(action, (i % 50) as u64 + 1, true));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = stats.snapshot().await;
    assert_eq!(snapshot.total_count, 1_000);
    let per_action_sum: usize = snapshot.per_action.values().map(|a| a.count).sum();
    assert_eq!(per_action_sum, 1_000);
    assert_eq!(snapshot.per_action.len(), actions.len());

    drop(stats);
    collector.await.unwrap();
}

#[tokio::test]
async fn snapshot_computes_latency_distribution() {
    let (stats, _collector) = spawn_collector();

    for millis in 1..=100 {
        stats.record(record("load", millis, true));
    }

    let snapshot = stats.snapshot().await;
    let action = &snapshot.per_action["load"];
    assert_eq!(action.count, 100);
    assert_eq!(action.success_count, 100);
    assert_eq!(action.min, Duration::from_millis(1));
    assert_eq!(action.max, Duration::from_millis(100));
    assert_eq!(action.mean, Duration::from_micros(50_500));
    assert_eq!(action.p50, Duration::from_millis(51));
    assert_eq!(action.p90, Duration::from_millis(90));
    assert_eq!(action.p99, Duration::from_millis(99));
}

#[tokio::test]
async fn failures_are_counted_but_kept() {
    let (stats, _collector) = spawn_collector();

    for i in 0..10 {
        stats.record(record("flaky", 5, i % 2 == 0));
    }

    let snapshot = stats.snapshot().await;
    let action = &snapshot.per_action["flaky"];
    assert_eq!(action.count, 10);
    assert_eq!(action.success_count, 5);
}

#[tokio::test]
async fn empty_snapshot_is_empty() {
    let (stats, _collector) = spawn_collector();
    let snapshot = stats.snapshot().await;
    assert_eq!(snapshot.total_count, 0);
    assert!(snapshot.per_action.is_empty());
}

#[tokio::test]
async fn snapshot_sees_records_sent_before_it() {
    let (stats, _collector) = spawn_collector();

    stats.record(record("first", 1, true));
    let early = stats.snapshot().await;
    assert_eq!(early.total_count, 1);

    stats.record(record("second", 1, true));
    let late = stats.snapshot().await;
    assert_eq!(late.total_count, 2);
}
