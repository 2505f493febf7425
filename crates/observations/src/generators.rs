//! Observation generators.
//!
//! One generator per (report type, privacy mechanism) pipeline. Generators
//! own their RNG so a generation pass replays deterministically under test,
//! and emit one batch per system profile seen on the day.

use crate::encoders::{random_id, IntegerEncoder, PrivateIntegerEncoder, StringHistogramEncoder};
use cobalt_core::observation::EventsBySystemProfile;
use cobalt_core::{
    MetricDefinition, Observation, ObservationBatch, ObservationGenerator, ObservationPayload,
    ReportDefinition, ReportKey, Result, StringListEntry, SystemProfile,
};
use cobalt_privacy::{add_noise, generate_noise, num_event_vectors};
use rand::Rng;
use tracing::debug;

/// De-identified occurrence counts: one integer observation per system
/// profile, listing every event vector's count.
pub struct IntegerObservationGenerator<R> {
    report_key: ReportKey,
    rng: R,
}

impl<R: Rng + Send> IntegerObservationGenerator<R> {
    pub fn new(report_key: ReportKey, rng: R) -> Self {
        Self { report_key, rng }
    }
}

impl<R: Rng + Send> ObservationGenerator for IntegerObservationGenerator<R> {
    fn generate_observations(
        &mut self,
        day_index: u32,
        events: &EventsBySystemProfile,
        _string_hash_list: &[StringListEntry],
    ) -> Result<Vec<ObservationBatch>> {
        let mut batches = Vec::with_capacity(events.len());
        for (system_profile, records) in events {
            if records.is_empty() {
                continue;
            }
            batches.push(ObservationBatch {
                report_key: self.report_key,
                day_index,
                system_profile: system_profile.clone(),
                observations: vec![IntegerEncoder.encode(records, &mut self.rng)],
            });
        }
        Ok(batches)
    }
}

/// De-identified string counts: one string histogram observation per system
/// profile, sharing the report/day's compacted string hash list.
pub struct StringHistogramObservationGenerator<R> {
    report_key: ReportKey,
    rng: R,
}

impl<R: Rng + Send> StringHistogramObservationGenerator<R> {
    pub fn new(report_key: ReportKey, rng: R) -> Self {
        Self { report_key, rng }
    }
}

impl<R: Rng + Send> ObservationGenerator for StringHistogramObservationGenerator<R> {
    fn generate_observations(
        &mut self,
        day_index: u32,
        events: &EventsBySystemProfile,
        string_hash_list: &[StringListEntry],
    ) -> Result<Vec<ObservationBatch>> {
        let mut batches = Vec::with_capacity(events.len());
        for (system_profile, records) in events {
            if records.is_empty() {
                continue;
            }
            batches.push(ObservationBatch {
                report_key: self.report_key,
                day_index,
                system_profile: system_profile.clone(),
                observations: vec![StringHistogramEncoder.encode(
                    records,
                    string_hash_list,
                    &mut self.rng,
                )],
            });
        }
        Ok(batches)
    }
}

/// Shuffled-DP occurrence counts.
///
/// Every aggregate row becomes one private index; fabricated indices are
/// mixed in per system profile. A day with no events still emits a
/// fabricated-only batch under the current system profile, so the absence of
/// an upload does not leak that nothing happened.
pub struct PrivateObservationGenerator<R> {
    report_key: ReportKey,
    metric: MetricDefinition,
    report: ReportDefinition,
    current_system_profile: SystemProfile,
    rng: R,
}

impl<R: Rng + Send> PrivateObservationGenerator<R> {
    pub fn new(
        report_key: ReportKey,
        metric: MetricDefinition,
        report: ReportDefinition,
        current_system_profile: SystemProfile,
        rng: R,
    ) -> Self {
        Self {
            report_key,
            metric,
            report,
            current_system_profile,
            rng,
        }
    }

    /// Largest private index the report can produce.
    fn max_index(&self) -> i64 {
        let total =
            num_event_vectors(&self.metric.dimensions) * u64::from(self.report.num_index_points);
        total as i64 - 1
    }

    fn to_observations(&mut self, indices: impl IntoIterator<Item = u64>) -> Vec<Observation> {
        indices
            .into_iter()
            .map(|index| Observation {
                payload: ObservationPayload::PrivateIndex(
                    cobalt_core::PrivateIndexObservation { index },
                ),
                random_id: random_id(&mut self.rng),
            })
            .collect()
    }
}

impl<R: Rng + Send> ObservationGenerator for PrivateObservationGenerator<R> {
    fn generate_observations(
        &mut self,
        day_index: u32,
        events: &EventsBySystemProfile,
        _string_hash_list: &[StringListEntry],
    ) -> Result<Vec<ObservationBatch>> {
        let max_index = self.max_index();
        let mut batches = Vec::with_capacity(events.len());

        for (system_profile, records) in events {
            let encoder = PrivateIntegerEncoder::new(&self.metric, &self.report);
            let mut real_indices = Vec::with_capacity(records.len());
            for record in records {
                real_indices.push(encoder.encode(
                    &record.event_vector,
                    &record.aggregate_value,
                    &mut self.rng,
                )?);
            }
            let indices = add_noise(real_indices, max_index, &self.report, &mut self.rng)?;
            batches.push(ObservationBatch {
                report_key: self.report_key,
                day_index,
                system_profile: system_profile.clone(),
                observations: self.to_observations(indices),
            });
        }

        if batches.is_empty() {
            debug!(report = %self.report_key, day_index, "No events, generating cover traffic");
            let fabricated = generate_noise(max_index, &self.report, &mut self.rng)?;
            let observations =
                self.to_observations(fabricated.into_iter().map(|observation| observation.index));
            if !observations.is_empty() {
                batches.push(ObservationBatch {
                    report_key: self.report_key,
                    day_index,
                    system_profile: self.current_system_profile.clone(),
                    observations,
                });
            }
        }

        Ok(batches)
    }
}
