//! # Aggregation Engine
//! Fans out to the implicated source adapters concurrently, merges their
//! pages, applies the post-merge predicate, stable-sorts by recency and
//! publishes the result atomically. Overlapping refreshes follow
//! "last request wins": a superseded refresh never overwrites a newer
//! predicate's published feed.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use metrics::{counter, gauge, histogram};

use crate::adapters::{FetchParams, SourceAdapter};
use crate::filter::FilterPredicate;
use crate::gate::SessionGate;
use crate::metrics::ensure_metrics_described;
use crate::record::ContentRecord;

pub struct AggregationEngine {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    gate: SessionGate,
    /// Published feed: readers get the Arc snapshot, never a partial list.
    feed: RwLock<Published>,
    /// Most recently requested predicate; the live trigger replays it.
    last_predicate: RwLock<Option<FilterPredicate>>,
    refresh_seq: AtomicU64,
}

/// Feed plus the sequence number that published it, kept together so
/// the compare-and-publish happens under one lock.
struct Published {
    records: Arc<Vec<ContentRecord>>,
    seq: u64,
}

impl AggregationEngine {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, gate: SessionGate) -> Self {
        ensure_metrics_described();
        Self {
            adapters,
            gate,
            feed: RwLock::new(Published {
                records: Arc::new(Vec::new()),
                seq: 0,
            }),
            last_predicate: RwLock::new(None),
            refresh_seq: AtomicU64::new(0),
        }
    }

    /// Re-fetch, merge and publish the feed for `predicate`. Returns the
    /// computed list to the caller even when a newer refresh superseded
    /// it; only the newest result is published.
    pub async fn refresh(&self, predicate: FilterPredicate) -> Vec<ContentRecord> {
        if !self.gate.is_active() {
            self.clear();
            return Vec::new();
        }

        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        *self
            .last_predicate
            .write()
            .expect("predicate lock poisoned") = Some(predicate.clone());

        let t0 = std::time::Instant::now();
        let implicated = predicate.kind.implicated_sources();
        let params = FetchParams {
            search_term: predicate.store_search_term(),
            include_deleted: predicate.include_deleted,
        };

        // Dispatch every implicated adapter before awaiting any, so their
        // latencies overlap. A failed adapter contributes an empty page
        // inside `fetch` and never cancels its siblings.
        let pages = join_all(
            self.adapters
                .iter()
                .filter(|a| implicated.contains(&a.source()))
                .map(|a| a.fetch(&params)),
        )
        .await;

        // The only point of cross-source merging.
        let merged: Vec<ContentRecord> = pages.into_iter().flatten().collect();
        let mut result = predicate.apply(&merged);
        // Stable sort: timestamp ties keep adapter emission order.
        result.sort_by_key(|r| Reverse(r.created_at));

        histogram!("surveil_refresh_merge_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        // Gate may have flipped mid-flight: abandon the result entirely.
        if !self.gate.is_active() {
            counter!("surveil_refresh_stale_total").increment(1);
            self.clear();
            return Vec::new();
        }
        // Last request wins: the sequence comparison and the feed write
        // happen under the same lock, so a superseded refresh can never
        // slip in between a newer refresh's check and its publish.
        {
            let mut feed = self.feed.write().expect("feed lock poisoned");
            if seq <= feed.seq {
                counter!("surveil_refresh_stale_total").increment(1);
                return result;
            }
            feed.records = Arc::new(result.clone());
            feed.seq = seq;
        }
        counter!("surveil_refresh_runs_total").increment(1);
        gauge!("surveil_feed_size").set(result.len() as f64);
        tracing::debug!(
            records = result.len(),
            kind = %predicate.kind,
            "published merged feed"
        );
        result
    }

    /// Immutable snapshot of the published feed.
    pub fn feed(&self) -> Arc<Vec<ContentRecord>> {
        self.feed.read().expect("feed lock poisoned").records.clone()
    }

    /// The predicate the console is currently viewing, if any.
    pub fn last_predicate(&self) -> Option<FilterPredicate> {
        self.last_predicate
            .read()
            .expect("predicate lock poisoned")
            .clone()
    }

    /// Back to empty/idle (gate off or console closed).
    pub fn clear(&self) {
        self.feed.write().expect("feed lock poisoned").records = Arc::new(Vec::new());
        *self
            .last_predicate
            .write()
            .expect("predicate lock poisoned") = None;
        gauge!("surveil_feed_size").set(0.0);
    }
}
