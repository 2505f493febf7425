//! Internal telemetry for the Cobalt engine.
//!
//! In-process counters and an operational-logging seam; nothing here leaves
//! the device. The host process decides what, if anything, to export.

pub mod metrics;
pub mod ops;
pub mod tracing_setup;

pub use metrics::*;
pub use ops::*;
pub use tracing_setup::*;
