//! Cache tier metrics.
//!
//! Four counters per prefix (hit_l1, hit_l2, miss, error), a latency
//! histogram labeled by source, and the L1 cost gauge.

use once_cell::sync::Lazy;
use prometheus::{Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Cache operation counter by prefix and result.
pub static CACHE_OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ops_total",
            "Total number of cache operations by result (hit_l1, hit_l2, miss, error)",
        )
        .namespace("roost")
        .subsystem("cache"),
        &["prefix", "result"],
    )
    .expect("failed to create CACHE_OPS_TOTAL metric")
});

/// Cache operation latency by prefix and source (l1, l2, fetch).
pub static CACHE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("duration_seconds", "Cache operation latency")
            .namespace("roost")
            .subsystem("cache"),
        &["prefix", "source"],
    )
    .expect("failed to create CACHE_DURATION_SECONDS metric")
});

/// Current memory usage of the L1 cache in bytes.
pub static CACHE_L1_COST_BYTES: Lazy<Gauge> = Lazy::new(|| {
    Gauge::with_opts(
        Opts::new("l1_cost_bytes", "Current memory usage of the L1 cache in bytes")
            .namespace("roost")
            .subsystem("cache"),
    )
    .expect("failed to create CACHE_L1_COST_BYTES metric")
});

/// Register the cache collectors with the process registry.
pub fn register(registry: &Registry) {
    registry
        .register(Box::new(CACHE_OPS_TOTAL.clone()))
        .expect("failed to register CACHE_OPS_TOTAL");
    registry
        .register(Box::new(CACHE_DURATION_SECONDS.clone()))
        .expect("failed to register CACHE_DURATION_SECONDS");
    registry
        .register(Box::new(CACHE_L1_COST_BYTES.clone()))
        .expect("failed to register CACHE_L1_COST_BYTES");
}

pub(crate) fn record_hit_l1(prefix: &str) {
    CACHE_OPS_TOTAL.with_label_values(&[prefix, "hit_l1"]).inc();
}

pub(crate) fn record_hit_l2(prefix: &str) {
    CACHE_OPS_TOTAL.with_label_values(&[prefix, "hit_l2"]).inc();
}

pub(crate) fn record_miss(prefix: &str) {
    CACHE_OPS_TOTAL.with_label_values(&[prefix, "miss"]).inc();
}

pub(crate) fn record_error(prefix: &str) {
    CACHE_OPS_TOTAL.with_label_values(&[prefix, "error"]).inc();
}

pub(crate) fn observe_duration(prefix: &str, source: &str, seconds: f64) {
    CACHE_DURATION_SECONDS
        .with_label_values(&[prefix, source])
        .observe(seconds);
}
