//! # Statistics Engine
//! Recomputes the whole snapshot on every invocation — never patches it
//! incrementally — so missed or out-of-order notifications cannot make
//! the numbers drift. Counts are issued per collection against the
//! entire backing store, not the capped page the feed holds. The timer
//! poll and the live trigger both route through the same single-flight
//! `snapshot()` entry point.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::gate::SessionGate;
use crate::metrics::ensure_metrics_described;
use crate::record::SourceType;
use crate::store::{Collection, ContentStore, CountFilter};

/// Default poll cadence for `spawn_poller`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

const SOURCE_COLLECTIONS: [(SourceType, Collection); 5] = [
    (SourceType::Post, Collection::Posts),
    (SourceType::Story, Collection::Stories),
    (SourceType::Message, Collection::Messages),
    (SourceType::Media, Collection::Media),
    (SourceType::Comment, Collection::Comments),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Whole-collection row counts per source, soft-deleted included.
    pub per_source: BTreeMap<SourceType, u64>,
    pub flagged_count: u64,
    /// Requires soft-delete visibility; zero whenever the gate is off.
    pub deleted_count: u64,
    /// Declared heuristic: (posts + media) x a fixed per-record size.
    /// Not an attempt at real byte accounting.
    pub storage_estimate_bytes: u64,
    pub computed_at: DateTime<Utc>,
}

impl StatsSnapshot {
    /// Zeroed snapshot for the idle/gated-off state.
    pub fn idle() -> Self {
        let mut per_source = BTreeMap::new();
        for source in SourceType::ORIGINS {
            per_source.insert(source, 0);
        }
        Self {
            per_source,
            flagged_count: 0,
            deleted_count: 0,
            storage_estimate_bytes: 0,
            computed_at: Utc::now(),
        }
    }
}

pub struct StatsEngine {
    store: Arc<dyn ContentStore>,
    gate: SessionGate,
    current: RwLock<Arc<StatsSnapshot>>,
    /// Single-flight guard: one recompute at a time; latecomers wait for
    /// the running one and share its result.
    inflight: Mutex<()>,
    storage_bytes_per_record: u64,
}

impl StatsEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        gate: SessionGate,
        storage_bytes_per_record: u64,
    ) -> Self {
        ensure_metrics_described();
        Self {
            store,
            gate,
            current: RwLock::new(Arc::new(StatsSnapshot::idle())),
            inflight: Mutex::new(()),
            storage_bytes_per_record,
        }
    }

    /// Recompute and publish a fresh snapshot. Gate off yields the idle
    /// snapshot and resets the cache; per-source query failures degrade
    /// that count to 0 instead of failing the snapshot.
    pub async fn snapshot(&self) -> Arc<StatsSnapshot> {
        if !self.gate.is_active() {
            return self.publish(Arc::new(StatsSnapshot::idle()));
        }

        let _guard = match self.inflight.try_lock() {
            Ok(g) => g,
            Err(_) => {
                // Another recompute is in flight: wait it out and take
                // its result instead of racing a duplicate.
                let _wait = self.inflight.lock().await;
                return self.cached();
            }
        };

        let mut per_source = BTreeMap::new();
        let mut deleted_count = 0u64;
        let mut flagged_count = 0u64;
        for (source, collection) in SOURCE_COLLECTIONS {
            per_source.insert(source, self.count_or_zero(collection, CountFilter::All).await);
            // Deleted rows are only visible under the surveillance
            // capability, which is what licensed this recompute.
            deleted_count += self.count_or_zero(collection, CountFilter::Deleted).await;
            flagged_count += self.count_or_zero(collection, CountFilter::Flagged).await;
        }

        // Gate flipped mid-compute: discard, report idle.
        if !self.gate.is_active() {
            return self.publish(Arc::new(StatsSnapshot::idle()));
        }

        let posts = per_source.get(&SourceType::Post).copied().unwrap_or(0);
        let media = per_source.get(&SourceType::Media).copied().unwrap_or(0);
        let snap = Arc::new(StatsSnapshot {
            per_source,
            flagged_count,
            deleted_count,
            storage_estimate_bytes: (posts + media).saturating_mul(self.storage_bytes_per_record),
            computed_at: Utc::now(),
        });

        counter!("surveil_stats_runs_total").increment(1);
        gauge!("surveil_stats_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
        self.publish(snap)
    }

    /// Last published snapshot without recomputing.
    pub fn cached(&self) -> Arc<StatsSnapshot> {
        self.current.read().expect("stats lock poisoned").clone()
    }

    /// Fixed-interval poll routing through `snapshot()`; stands down as
    /// soon as the gate goes inactive.
    pub fn spawn_poller(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut gate_rx = engine.gate.watch();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !engine.gate.is_active() {
                            break;
                        }
                        engine.snapshot().await;
                    }
                    changed = gate_rx.changed() => {
                        if changed.is_err() || !*gate_rx.borrow() {
                            engine.publish(Arc::new(StatsSnapshot::idle()));
                            break;
                        }
                    }
                }
            }
            tracing::debug!("stats poller stopped");
        })
    }

    fn publish(&self, snap: Arc<StatsSnapshot>) -> Arc<StatsSnapshot> {
        *self.current.write().expect("stats lock poisoned") = snap.clone();
        snap
    }

    async fn count_or_zero(&self, collection: Collection, filter: CountFilter) -> u64 {
        match self.store.count(collection, filter).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = ?e, collection = %collection, "count query failed, defaulting to 0");
                counter!("surveil_stats_query_errors_total").increment(1);
                0
            }
        }
    }
}
