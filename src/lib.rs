//! Cobalt: privacy-preserving local telemetry aggregation.
//!
//! Events are aggregated on-device into per-day counts and string histograms
//! keyed by report, event vector, and system profile. Once per day the
//! aggregates are converted into anonymized observation batches (de-identified
//! or shuffled-DP encoded) and queued for upload.
//!
//! The embedding surface lives in this crate:
//! - [`CobaltLogger`]: the per-event entry point host code calls.
//! - [`CobaltPeriodicJob`]: the day-boundary generation pass and
//!   upload-queue access.
//! - [`config`]: engine settings and registry loading.
//!
//! The engine itself is split across the workspace: `cobalt-core` (data
//! model, registry), `cobalt-privacy` (index math, shuffled-DP noise),
//! `cobalt-store` (aggregate store and `DataService`), `cobalt-observations`
//! (encoders and generators), and `cobalt-telemetry` (tracing and
//! operational counters).

pub mod config;
pub mod logger;
pub mod periodic;

pub use config::{load_config, load_registry, CobaltConfig};
pub use logger::CobaltLogger;
pub use periodic::CobaltPeriodicJob;

pub use cobalt_core::{
    day_index, Clock, EventVector, Registry, ReportKey, Result, SystemClock, SystemProfile,
};
pub use cobalt_store::{DataService, MemoryStore, StoredObservationBatch};
