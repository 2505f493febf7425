//! Internal metrics collection.
//!
//! Counters are collected in-memory; the host process may snapshot and
//! export them on whatever cadence it likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// Collected metrics for the Cobalt engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Aggregation path
    pub events_aggregated: Counter,
    pub events_dropped_disabled: Counter,
    pub event_vector_buffer_exceeded: Counter,
    pub string_buffer_exceeded: Counter,

    // Generation path
    pub generation_passes: Counter,
    pub observations_generated: Counter,
    pub batches_generated: Counter,
    pub corrupt_rows_skipped: Counter,

    // Upload queue
    pub batches_removed_after_send: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_aggregated: u64,
    pub events_dropped_disabled: u64,
    pub event_vector_buffer_exceeded: u64,
    pub string_buffer_exceeded: u64,
    pub generation_passes: u64,
    pub observations_generated: u64,
    pub batches_generated: u64,
    pub corrupt_rows_skipped: u64,
    pub batches_removed_after_send: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_aggregated: self.events_aggregated.get(),
            events_dropped_disabled: self.events_dropped_disabled.get(),
            event_vector_buffer_exceeded: self.event_vector_buffer_exceeded.get(),
            string_buffer_exceeded: self.string_buffer_exceeded.get(),
            generation_passes: self.generation_passes.get(),
            observations_generated: self.observations_generated.get(),
            batches_generated: self.batches_generated.get(),
            corrupt_rows_skipped: self.corrupt_rows_skipped.get(),
            batches_removed_after_send: self.batches_removed_after_send.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
