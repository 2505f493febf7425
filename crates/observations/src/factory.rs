//! Generator selection per (report type, privacy mechanism).

use crate::generators::{
    IntegerObservationGenerator, PrivateObservationGenerator, StringHistogramObservationGenerator,
};
use cobalt_core::{
    MetricDefinition, ObservationGenerator, PrivacyMechanism, ReportDefinition, ReportKey,
    ReportType, SystemProfile,
};
use rand::Rng;

/// Builds the generator pipeline for a report.
///
/// The dispatch table is exhaustive by construction: a combination with no
/// generator is a registry-authoring bug, not a runtime condition, so
/// unsupported combinations panic. `RegistryValidator` rejects them before a
/// registry is accepted.
pub struct ObservationGeneratorFactory {
    current_system_profile: SystemProfile,
}

impl ObservationGeneratorFactory {
    pub fn new(current_system_profile: SystemProfile) -> Self {
        Self {
            current_system_profile,
        }
    }

    /// The generator for one report.
    ///
    /// # Panics
    ///
    /// Panics if the (report type, privacy mechanism) combination has no
    /// generator pipeline.
    pub fn generator_for<R: Rng + Send + 'static>(
        &self,
        report_key: ReportKey,
        metric: &MetricDefinition,
        report: &ReportDefinition,
        rng: R,
    ) -> Box<dyn ObservationGenerator> {
        match (report.report_type, report.privacy_mechanism) {
            (ReportType::FleetwideOccurrenceCounts, PrivacyMechanism::DeIdentification) => {
                Box::new(IntegerObservationGenerator::new(report_key, rng))
            }
            (
                ReportType::FleetwideOccurrenceCounts,
                PrivacyMechanism::ShuffledDifferentialPrivacy,
            ) => Box::new(PrivateObservationGenerator::new(
                report_key,
                metric.clone(),
                report.clone(),
                self.current_system_profile.clone(),
                rng,
            )),
            (ReportType::StringCounts, PrivacyMechanism::DeIdentification) => {
                Box::new(StringHistogramObservationGenerator::new(report_key, rng))
            }
            (ReportType::StringCounts, PrivacyMechanism::ShuffledDifferentialPrivacy) => {
                panic!(
                    "report {report_key}: string counts do not support shuffled differential privacy"
                )
            }
        }
    }
}
