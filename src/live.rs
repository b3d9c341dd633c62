//! # Live-Update Trigger
//! Subscribes to the change channel of each backing collection. Any
//! notification from any channel means "invalidate and refetch": the
//! statistics engine always recomputes, and if the console has a feed
//! open the aggregation engine replays its last predicate. No payload
//! diffing — deliberately redundant refetches over incremental-update
//! complexity.
//!
//! Lifecycle: `Idle -> (gate on) start() -> Subscribed -> cancel() |
//! gate off -> Idle`. Cancellation is synchronous; after it, no further
//! callbacks fire, even for notifications already in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use metrics::counter;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::aggregate::AggregationEngine;
use crate::gate::SessionGate;
use crate::metrics::ensure_metrics_described;
use crate::stats::StatsEngine;
use crate::store::{Collection, ContentStore};

pub struct LiveUpdateTrigger {
    store: Arc<dyn ContentStore>,
    gate: SessionGate,
}

/// Cancellation handle for a running trigger. Dropping it cancels too.
pub struct LiveHandle {
    inner: Arc<HandleInner>,
}

#[derive(Default)]
struct HandleInner {
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cancelled: AtomicBool,
}

impl HandleInner {
    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut tasks = self.tasks.lock().expect("live handle lock poisoned");
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl LiveHandle {
    /// Synchronously tear down every channel subscription.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

impl LiveUpdateTrigger {
    pub fn new(store: Arc<dyn ContentStore>, gate: SessionGate) -> Self {
        Self { store, gate }
    }

    /// Subscribe to all five collections. A channel that fails to
    /// subscribe is logged and skipped; the others proceed. Returns a
    /// no-op cancelled handle when the gate is already off.
    pub fn start(&self, engine: Arc<AggregationEngine>, stats: Arc<StatsEngine>) -> LiveHandle {
        ensure_metrics_described();
        let inner = Arc::new(HandleInner::default());

        if !self.gate.is_active() {
            tracing::debug!("live trigger not started: gate inactive");
            inner.cancelled.store(true, Ordering::SeqCst);
            return LiveHandle { inner };
        }

        let mut tasks = Vec::with_capacity(Collection::ALL.len() + 1);
        for collection in Collection::ALL {
            let mut rx = match self.store.subscribe(collection) {
                Ok(rx) => rx,
                Err(e) => {
                    tracing::warn!(error = ?e, collection = %collection, "change subscription failed, channel skipped");
                    counter!("surveil_live_subscribe_errors_total").increment(1);
                    continue;
                }
            };

            let engine = engine.clone();
            let stats = stats.clone();
            let gate = self.gate.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        // A lagged receiver only means we missed some
                        // notices; the next refetch covers them all.
                        Ok(_) | Err(RecvError::Lagged(_)) => {
                            if !gate.is_active() {
                                break;
                            }
                            counter!("surveil_live_notices_total").increment(1);
                            stats.snapshot().await;
                            if let Some(predicate) = engine.last_predicate() {
                                engine.refresh(predicate).await;
                            }
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                tracing::debug!(collection = %collection, "live channel task stopped");
            }));
        }
        *inner.tasks.lock().expect("live handle lock poisoned") = tasks;

        // Gate watcher: the instant surveillance goes inactive, tear
        // everything down without waiting for the next notification.
        let watcher = {
            let inner = Arc::clone(&inner);
            let mut rx = self.gate.watch();
            tokio::spawn(async move {
                loop {
                    if !*rx.borrow_and_update() {
                        inner.cancel();
                        break;
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            })
        };
        inner
            .tasks
            .lock()
            .expect("live handle lock poisoned")
            .push(watcher);

        // The gate may have flipped while we were subscribing.
        if !self.gate.is_active() {
            inner.cancel();
        }

        LiveHandle { inner }
    }
}
