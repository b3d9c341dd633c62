// src/logging.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the compact console subscriber. Safe to call more than once;
/// later calls are no-ops (tests share one process-wide subscriber).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ghostfeed=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
