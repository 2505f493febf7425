//! Mock implementations for testing.

use cobalt_telemetry::OperationLogger;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Operation logger that counts buffer-exceeded events in memory.
///
/// Implements the same `OperationLogger` trait as the production tracing
/// logger, letting tests assert exactly which diagnostics the engine would
/// have emitted.
#[derive(Default)]
pub struct CountingOperationLogger {
    event_vector_exceeded: AtomicU64,
    string_exceeded: AtomicU64,
}

impl CountingOperationLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn event_vector_exceeded_count(&self) -> u64 {
        self.event_vector_exceeded.load(Ordering::Relaxed)
    }

    pub fn string_exceeded_count(&self) -> u64 {
        self.string_exceeded.load(Ordering::Relaxed)
    }
}

impl OperationLogger for CountingOperationLogger {
    fn event_vector_buffer_max_exceeded(&self, _metric_id: u32, _report_id: u32) {
        self.event_vector_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    fn string_buffer_max_exceeded(&self, _metric_id: u32, _report_id: u32) {
        self.string_exceeded.fetch_add(1, Ordering::Relaxed);
    }
}
