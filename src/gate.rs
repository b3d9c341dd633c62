//! # Session Gate
//! The surveillance capability flag. Every component checks it before
//! doing work; deactivation is broadcast over a watch channel so
//! in-flight refreshes, pollers and subscriptions can stand down
//! immediately instead of finishing stale work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct SessionGate {
    inner: Arc<Inner>,
}

struct Inner {
    active: AtomicBool,
    tx: watch::Sender<bool>,
}

impl SessionGate {
    /// New gate in the inactive state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                active: AtomicBool::new(false),
                tx,
            }),
        }
    }

    pub fn activate(&self) {
        self.inner.active.store(true, Ordering::SeqCst);
        self.inner.tx.send_replace(true);
    }

    pub fn deactivate(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        self.inner.tx.send_replace(false);
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Receiver that observes gate flips; used by pollers and the live
    /// trigger to tear down the moment surveillance goes inactive.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.inner.tx.subscribe()
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}
