//! Validation of metric/report combinations against what the engine supports.

use super::{MetricDefinition, MetricType, PrivacyMechanism, ReportDefinition, ReportType};
use tracing::warn;

/// Validates that registry objects are valid and supported by this client.
///
/// Invalid reports are skipped at logging and generation time; validation
/// failures indicate registry-authoring bugs, not runtime conditions.
pub struct RegistryValidator;

impl RegistryValidator {
    /// Whether `metric` and `report` are a valid and supported combination.
    pub fn is_valid(metric: &MetricDefinition, report: &ReportDefinition) -> bool {
        if !Self::validate_report_type(metric.metric_type, report.report_type) {
            warn!(
                metric_id = metric.id,
                report_id = report.id,
                "metric type and report type failed validation"
            );
            return false;
        }

        if !Self::validate_privacy_mechanism(report.report_type, report.privacy_mechanism) {
            warn!(
                metric_id = metric.id,
                report_id = report.id,
                "report type and privacy mechanism failed validation"
            );
            return false;
        }

        if !Self::validate_private_fields(metric, report) {
            warn!(
                metric_id = metric.id,
                report_id = report.id,
                "privacy encoding fields failed validation"
            );
            return false;
        }

        true
    }

    fn validate_report_type(metric_type: MetricType, report_type: ReportType) -> bool {
        match metric_type {
            MetricType::Occurrence => report_type == ReportType::FleetwideOccurrenceCounts,
            MetricType::String => report_type == ReportType::StringCounts,
        }
    }

    fn validate_privacy_mechanism(
        report_type: ReportType,
        privacy_mechanism: PrivacyMechanism,
    ) -> bool {
        match report_type {
            ReportType::FleetwideOccurrenceCounts => true,
            ReportType::StringCounts => {
                privacy_mechanism == PrivacyMechanism::DeIdentification
            }
        }
    }

    /// Private reports need coherent clipping/quantization/noise parameters
    /// and an index space that fits the wire format; non-private reports
    /// must leave them unset.
    fn validate_private_fields(metric: &MetricDefinition, report: &ReportDefinition) -> bool {
        match report.privacy_mechanism {
            PrivacyMechanism::DeIdentification => {
                report.min_value == 0
                    && report.max_value == 0
                    && report.num_index_points == 0
                    && report.poisson_mean == 0.0
            }
            PrivacyMechanism::ShuffledDifferentialPrivacy => {
                if report.min_value <= 0 || report.max_value < report.min_value {
                    return false;
                }
                if report.num_index_points == 0 || report.poisson_mean <= 0.0 {
                    return false;
                }
                let num_event_vectors: u64 = metric
                    .dimensions
                    .iter()
                    .map(|d| d.cardinality())
                    .product::<u64>()
                    .max(1);
                let num_private_indices =
                    u64::from(report.num_index_points).saturating_mul(num_event_vectors);
                num_private_indices < i32::MAX as u64
            }
        }
    }
}
