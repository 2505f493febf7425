//! Operational logging seam for diagnostics counters.
//!
//! The aggregation path reports resource-exhaustion events through this
//! trait so the host can forward them to its own diagnostics pipeline. These
//! counters are purely operational: they carry metric/report ids, never
//! logged values.

use crate::metrics::metrics;
use tracing::warn;

/// Receives diagnostic counter events from the engine.
pub trait OperationLogger: Send + Sync {
    /// A distinct event vector was dropped because the per
    /// report/day/profile buffer was full.
    fn event_vector_buffer_max_exceeded(&self, metric_id: u32, report_id: u32);

    /// A string was dropped because the per report/day string list was full.
    fn string_buffer_max_exceeded(&self, metric_id: u32, report_id: u32);
}

/// Default implementation: a structured warning plus the in-process counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOperationLogger;

impl OperationLogger for TracingOperationLogger {
    fn event_vector_buffer_max_exceeded(&self, metric_id: u32, report_id: u32) {
        metrics().event_vector_buffer_exceeded.inc();
        warn!(
            metric_id,
            report_id, "dropping event vector: event_vector_buffer_max exceeded"
        );
    }

    fn string_buffer_max_exceeded(&self, metric_id: u32, report_id: u32) {
        metrics().string_buffer_exceeded.inc();
        warn!(
            metric_id,
            report_id, "dropping string: string_buffer_max exceeded"
        );
    }
}

/// No-op implementation for embedders that do their own accounting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpOperationLogger;

impl OperationLogger for NoOpOperationLogger {
    fn event_vector_buffer_max_exceeded(&self, _metric_id: u32, _report_id: u32) {}

    fn string_buffer_max_exceeded(&self, _metric_id: u32, _report_id: u32) {}
}
