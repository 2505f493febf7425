//! Observation generation for the Cobalt engine.
//!
//! Converts one day's aggregated event records into wire-ready observation
//! batches. `factory` picks the generator for a (report type, privacy
//! mechanism) pair; generators group records by system profile and drive the
//! encoders in `encoders`, routing through `cobalt_privacy` for shuffled-DP
//! reports.

pub mod encoders;
pub mod factory;
pub mod generators;

pub use encoders::{IntegerEncoder, PrivateIntegerEncoder, StringHistogramEncoder};
pub use factory::ObservationGeneratorFactory;
pub use generators::{
    IntegerObservationGenerator, PrivateObservationGenerator, StringHistogramObservationGenerator,
};
