//! Metrics module for analytics-service.
//! Provides Prometheus metrics for metric computations, cache behavior
//! and database queries, with per-tenant labels.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "analytics_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Metric computations counter (per-tenant metering)
pub static METRIC_COMPUTATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Cache hit counter
pub static CACHE_HITS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Cache miss counter
pub static CACHE_MISSES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    METRIC_COMPUTATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "analytics_metric_computations_total",
                "Total metric computations by tenant and metric"
            ),
            &["app_id", "org_id", "metric"]
        )
        .expect("Failed to register METRIC_COMPUTATIONS_TOTAL")
    });

    CACHE_HITS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "analytics_cache_hits_total",
                "Metric cache hits by metric"
            ),
            &["metric"]
        )
        .expect("Failed to register CACHE_HITS_TOTAL")
    });

    CACHE_MISSES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "analytics_cache_misses_total",
                "Metric cache misses by metric"
            ),
            &["metric"]
        )
        .expect("Failed to register CACHE_MISSES_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a metric computation.
pub fn record_metric_computation(app_id: &str, org_id: &str, metric: &str) {
    if let Some(counter) = METRIC_COMPUTATIONS_TOTAL.get() {
        counter.with_label_values(&[app_id, org_id, metric]).inc();
    }
}

/// Record a cache hit.
pub fn record_cache_hit(metric: &str) {
    if let Some(counter) = CACHE_HITS_TOTAL.get() {
        counter.with_label_values(&[metric]).inc();
    }
}

/// Record a cache miss.
pub fn record_cache_miss(metric: &str) {
    if let Some(counter) = CACHE_MISSES_TOTAL.get() {
        counter.with_label_values(&[metric]).inc();
    }
}
