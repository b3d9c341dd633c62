// src/lib.rs
// Public library surface: the moderation console's content-surveillance
// aggregator. Merges five independently-shaped content sources into one
// normalized, filterable, continuously-fresh feed plus a statistics
// summary, all gated behind the surveillance capability flag.
// Library-level only: no wire protocol, no UI state.

pub mod adapters;
pub mod aggregate;
pub mod config;
pub mod creators;
pub mod filter;
pub mod gate;
pub mod live;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod stats;
pub mod store;

// ---- Re-exports for a stable public API ----
pub use crate::adapters::{standard_adapters, FetchParams, SourceAdapter};
pub use crate::aggregate::AggregationEngine;
pub use crate::config::SurveillanceConfig;
pub use crate::creators::CreatorResolver;
pub use crate::filter::{FilterKind, FilterPredicate};
pub use crate::gate::SessionGate;
pub use crate::live::{LiveHandle, LiveUpdateTrigger};
pub use crate::logging::init_tracing;
pub use crate::record::{
    ContentRecord, Counters, CreatorSummary, Monetization, SourceType, Visibility,
};
pub use crate::stats::{StatsEngine, StatsSnapshot, DEFAULT_POLL_INTERVAL};
pub use crate::store::{ContentStore, CreatorDirectory};

use std::sync::Arc;

/// Everything the console needs, wired over one store + directory: both
/// engines share the gate and the trigger is ready to `start`.
pub struct Surveillance {
    pub gate: SessionGate,
    pub engine: Arc<AggregationEngine>,
    pub stats: Arc<StatsEngine>,
    pub trigger: LiveUpdateTrigger,
}

impl Surveillance {
    pub fn new(
        store: Arc<dyn ContentStore>,
        directory: Arc<dyn CreatorDirectory>,
        cfg: &SurveillanceConfig,
    ) -> Self {
        let gate = SessionGate::new();
        let adapters = standard_adapters(store.clone(), directory, cfg.page_cap);
        let engine = Arc::new(AggregationEngine::new(adapters, gate.clone()));
        let stats = Arc::new(StatsEngine::new(
            store.clone(),
            gate.clone(),
            cfg.storage_bytes_per_record,
        ));
        let trigger = LiveUpdateTrigger::new(store, gate.clone());
        Self {
            gate,
            engine,
            stats,
            trigger,
        }
    }
}
