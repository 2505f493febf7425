//! Registry fixtures and a fully wired engine harness.

use crate::mocks::CountingOperationLogger;
use chrono::{TimeZone, Utc};
use cobalt::{CobaltLogger, CobaltPeriodicJob, DataService, MemoryStore};
use cobalt_core::{
    FakeClock, MetricDefinition, MetricDimension, MetricType, PrivacyMechanism, Registry,
    ReportDefinition, ReportType, SystemProfile,
};
use cobalt_observations::ObservationGeneratorFactory;
use std::sync::Arc;

pub const CUSTOMER_ID: u32 = 1;
pub const PROJECT_ID: u32 = 2;
pub const OCCURRENCE_METRIC_ID: u32 = 3;
pub const DEID_REPORT_ID: u32 = 4;
pub const PRIVATE_REPORT_ID: u32 = 5;
pub const STRING_METRIC_ID: u32 = 7;
pub const STRING_REPORT_ID: u32 = 8;

/// 2022-07-28, the fixed "today" of the harness clock.
pub const TODAY: u32 = 19201;

/// De-identified occurrence report.
pub fn deid_report(event_vector_buffer_max: u64) -> ReportDefinition {
    ReportDefinition {
        id: DEID_REPORT_ID,
        report_type: ReportType::FleetwideOccurrenceCounts,
        privacy_mechanism: PrivacyMechanism::DeIdentification,
        min_value: 0,
        max_value: 0,
        num_index_points: 0,
        poisson_mean: 0.0,
        event_vector_buffer_max,
        string_buffer_max: 0,
    }
}

/// Shuffled-DP occurrence report over `[1, 20]` with 11 index points.
pub fn private_report(poisson_mean: f64) -> ReportDefinition {
    ReportDefinition {
        id: PRIVATE_REPORT_ID,
        report_type: ReportType::FleetwideOccurrenceCounts,
        privacy_mechanism: PrivacyMechanism::ShuffledDifferentialPrivacy,
        min_value: 1,
        max_value: 20,
        num_index_points: 11,
        poisson_mean,
        event_vector_buffer_max: 0,
        string_buffer_max: 0,
    }
}

/// De-identified string-counts report.
pub fn string_report(string_buffer_max: u64) -> ReportDefinition {
    ReportDefinition {
        id: STRING_REPORT_ID,
        report_type: ReportType::StringCounts,
        privacy_mechanism: PrivacyMechanism::DeIdentification,
        min_value: 0,
        max_value: 0,
        num_index_points: 0,
        poisson_mean: 0.0,
        event_vector_buffer_max: 0,
        string_buffer_max,
    }
}

/// Occurrence metric with dimensions `[max_event_code=2] x [codes {5, 6}]`,
/// spanning 6 event vectors.
pub fn occurrence_metric(reports: Vec<ReportDefinition>) -> MetricDefinition {
    MetricDefinition {
        id: OCCURRENCE_METRIC_ID,
        metric_type: MetricType::Occurrence,
        dimensions: vec![
            MetricDimension { event_codes: vec![], max_event_code: Some(2) },
            MetricDimension { event_codes: vec![5, 6], max_event_code: None },
        ],
        reports,
    }
}

/// Dimensionless string metric.
pub fn string_metric(reports: Vec<ReportDefinition>) -> MetricDefinition {
    MetricDefinition {
        id: STRING_METRIC_ID,
        metric_type: MetricType::String,
        dimensions: vec![],
        reports,
    }
}

pub fn registry(metrics: Vec<MetricDefinition>) -> Registry {
    Registry {
        customer_id: CUSTOMER_ID,
        project_id: PROJECT_ID,
        metrics,
    }
}

pub fn device_profile() -> SystemProfile {
    SystemProfile {
        os: Some("fuchsia".into()),
        arch: Some("arm64".into()),
        board_name: None,
        system_version: Some("12.0".into()),
        app_version: Some("1.2.3".into()),
    }
}

/// A fully wired engine over the in-memory store.
pub struct Engine {
    pub logger: CobaltLogger<MemoryStore>,
    pub job: CobaltPeriodicJob<MemoryStore>,
    pub data_service: Arc<DataService<MemoryStore>>,
    pub clock: Arc<FakeClock>,
    pub op_logger: Arc<CountingOperationLogger>,
}

impl Engine {
    /// Wire up the engine and record the logger as enabled, the way an
    /// embedding host does at startup once consent is known.
    pub async fn new(registry: Registry) -> Self {
        let op_logger = CountingOperationLogger::new();
        let data_service = Arc::new(DataService::new(MemoryStore::new(), op_logger.clone()));
        let clock = Arc::new(FakeClock::new(
            Utc.with_ymd_and_hms(2022, 7, 28, 12, 0, 0).unwrap(),
        ));
        let logger = CobaltLogger::new(
            data_service.clone(),
            registry.clone(),
            device_profile(),
            clock.clone(),
            true,
        );
        let job = CobaltPeriodicJob::new(
            data_service.clone(),
            registry,
            ObservationGeneratorFactory::new(device_profile()),
            clock.clone(),
            30,
        );
        logger.set_enabled(true).await.unwrap();
        Self {
            logger,
            job,
            data_service,
            clock,
            op_logger,
        }
    }
}
