// src/metrics.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up wherever the
/// embedder exports them).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "surveil_adapter_errors_total",
            "Source adapter fetch failures (recovered as empty pages)."
        );
        describe_counter!(
            "surveil_refresh_runs_total",
            "Feed refreshes that published a result."
        );
        describe_counter!(
            "surveil_refresh_stale_total",
            "Refreshes discarded as superseded or gated off mid-flight."
        );
        describe_histogram!(
            "surveil_refresh_merge_ms",
            "Fan-out + merge + filter + sort time in milliseconds."
        );
        describe_counter!(
            "surveil_stats_runs_total",
            "Statistics snapshots recomputed."
        );
        describe_counter!(
            "surveil_stats_query_errors_total",
            "Per-source count queries that failed (defaulted to 0)."
        );
        describe_counter!(
            "surveil_live_notices_total",
            "Change notifications handled by the live-update trigger."
        );
        describe_counter!(
            "surveil_live_subscribe_errors_total",
            "Collections whose change channel failed to subscribe."
        );
        describe_gauge!("surveil_feed_size", "Records in the published feed.");
        describe_gauge!(
            "surveil_stats_last_run_ts",
            "Unix ts when the statistics engine last recomputed."
        );
    });
}
