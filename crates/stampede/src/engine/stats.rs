use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// One completed action from one virtual user. Ownership moves to the
/// collector as soon as the record is produced; it is never mutated.
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub action_name: String,
    pub started_at: SystemTime,
    pub duration: Duration,
    pub succeeded: bool,
    pub status_code: Option<u16>,
}

/// Summary derived from the records observed so far. Always recomputed
/// from the raw records on request; the raw records stay the source of
/// truth.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateStats {
    pub total_count: usize,
    pub per_action: HashMap<String, ActionStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionStats {
    pub count: usize,
    pub success_count: usize,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

enum StatsMessage {
    Record(OutcomeRecord),
    Snapshot(oneshot::Sender<AggregateStats>),
}

/// Cloneable sender side of the collector. Every virtual user holds one;
/// records travel over the channel so no lock is shared across users.
#[derive(Clone)]
pub struct StatsHandle {
    tx: mpsc::UnboundedSender<StatsMessage>,
}

impl StatsHandle {
    /// Never blocks. A record sent after the collector has shut down is
    /// dropped silently; by then the run is over.
    pub fn record(&self, outcome: OutcomeRecord) {
        crate::metrics::REQUESTS_TOTAL.inc();
        if !outcome.succeeded {
            crate::metrics::REQUEST_FAILURES.inc();
        }
        let _ = self.tx.send(StatsMessage::Record(outcome));
    }

    /// Consistent view of every record the collector had accepted before
    /// this call; records racing in concurrently may or may not appear.
    pub async fn snapshot(&self) -> AggregateStats {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(StatsMessage::Snapshot(reply_tx)).is_err() {
            return AggregateStats::default();
        }
        reply_rx.await.unwrap_or_default()
    }
}

/// Spawns the single collector task that owns the record store. The task
/// exits once every `StatsHandle` clone has been dropped.
pub fn spawn_collector() -> (StatsHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut records: Vec<OutcomeRecord> = Vec::new();
        while let Some(msg) = rx.recv().await {
            match msg {
                StatsMessage::Record(outcome) => records.push(outcome),
                StatsMessage::Snapshot(reply) => {
                    let _ = reply.send(compute_stats(&records));
                }
            }
        }
        debug!(records = records.len(), "Stats collector drained");
    });

    (StatsHandle { tx }, handle)
}

fn compute_stats(records: &[OutcomeRecord]) -> AggregateStats {
    let mut grouped: HashMap<&str, Vec<&OutcomeRecord>> = HashMap::new();
    for record in records {
        grouped
            .entry(record.action_name.as_str())
            .or_default()
            .push(record);
    }

    let mut per_action = HashMap::new();
    for (name, group) in grouped {
        let success_count = group.iter().filter(|r| r.succeeded).count();
        let mut latencies: Vec<Duration> = group.iter().map(|r| r.duration).collect();
        latencies.sort_unstable();

        let count = latencies.len();
        let total: Duration = latencies.iter().sum();
        let percentile = |p: f64| -> Duration {
            let rank = ((p / 100.0) * (count as f64 - 1.0)).round() as usize;
            latencies[rank]
        };

        per_action.insert(
            name.to_string(),
            ActionStats {
                count,
                success_count,
                min: latencies[0],
                max: latencies[count - 1],
                mean: total / count as u32,
                p50: percentile(50.0),
                p90: percentile(90.0),
                p99: percentile(99.0),
            },
        );
    }

    AggregateStats {
        total_count: records.len(),
        per_action,
    }
}
