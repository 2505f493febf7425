//! Core types for the Cobalt local telemetry aggregation engine.
//!
//! This crate holds the data model shared by every other crate in the
//! workspace: report identifiers, event vectors, system profiles, aggregate
//! values, observation payloads, the metric/report registry, and the unified
//! error type.

pub mod aggregate;
pub mod clock;
pub mod day;
pub mod error;
pub mod event;
pub mod observation;
pub mod registry;
pub mod report;
pub mod string_hash;
pub mod system_profile;

pub use aggregate::{AggregateValue, HistogramBucket};
pub use clock::{Clock, FakeClock, SystemClock};
pub use day::{day_index, DayIndex};
pub use error::{Error, Result};
pub use event::{EventRecord, EventVector};
pub use observation::{
    IndexHistogram, IntegerObservation, IntegerObservationValue, Observation, ObservationBatch,
    ObservationGenerator, ObservationPayload, PrivateIndexObservation, StringHistogramObservation,
    RANDOM_ID_LEN,
};
pub use registry::{
    MetricDefinition, MetricDimension, MetricType, PrivacyMechanism, Registry, RegistryValidator,
    ReportDefinition, ReportType,
};
pub use report::ReportKey;
pub use string_hash::{string_hash_ff64, StringHash, StringListEntry};
pub use system_profile::SystemProfile;
