//! Per-event logging entry point.

use cobalt_core::{
    day_index, Clock, Error, EventVector, MetricDefinition, MetricType, Registry,
    RegistryValidator, ReportKey, ReportType, Result, SystemProfile,
};
use cobalt_store::{DaoBuildingBlocks, DataService};
use cobalt_telemetry::metrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The per-event logging surface host code calls.
///
/// Each log call resolves the metric's validated reports from the registry
/// and fans out one aggregation per report, stamped with the current day
/// index and system profile. A disabled logger drops events.
///
/// Hosts call [`set_enabled`](Self::set_enabled) once at startup when the
/// consent state is known; the recorded enablement time bounds how far back
/// observation generation may reach.
pub struct CobaltLogger<D> {
    data_service: Arc<DataService<D>>,
    registry: Registry,
    system_profile: SystemProfile,
    clock: Arc<dyn Clock>,
    enabled: AtomicBool,
}

impl<D: DaoBuildingBlocks> CobaltLogger<D> {
    pub fn new(
        data_service: Arc<DataService<D>>,
        registry: Registry,
        system_profile: SystemProfile,
        clock: Arc<dyn Clock>,
        enabled: bool,
    ) -> Self {
        Self {
            data_service,
            registry,
            system_profile,
            clock,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable event logging, recording the transition time so the
    /// generation pass knows how far back it may reach.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let now = self.clock.now();
        self.enabled.store(enabled, Ordering::Relaxed);
        if enabled {
            self.data_service.logger_enabled(now).await?;
        } else {
            self.data_service.logger_disabled(now).await?;
        }
        Ok(())
    }

    /// Log `count` occurrences of an event for an occurrence metric.
    pub async fn log_occurrence(
        &self,
        metric_id: u32,
        count: i64,
        event_codes: Vec<u32>,
    ) -> Result<()> {
        if !self.is_enabled() {
            metrics().events_dropped_disabled.inc();
            debug!(metric_id, "Logger disabled, dropping occurrence event");
            return Ok(());
        }
        let metric = self.metric(metric_id, MetricType::Occurrence)?;
        let event_vector = EventVector::new(event_codes);
        let today = day_index(self.clock.now());

        for report in &metric.reports {
            if !RegistryValidator::is_valid(metric, report) {
                continue;
            }
            if report.report_type != ReportType::FleetwideOccurrenceCounts {
                continue;
            }
            self.data_service
                .aggregate_count(
                    self.report_key(metric_id, report.id),
                    today,
                    &self.system_profile,
                    event_vector.clone(),
                    report.event_vector_buffer_max,
                    count,
                )
                .await?;
        }
        Ok(())
    }

    /// Log one observation of a string value for a string metric.
    pub async fn log_string(
        &self,
        metric_id: u32,
        value: &str,
        event_codes: Vec<u32>,
    ) -> Result<()> {
        if !self.is_enabled() {
            metrics().events_dropped_disabled.inc();
            debug!(metric_id, "Logger disabled, dropping string event");
            return Ok(());
        }
        let metric = self.metric(metric_id, MetricType::String)?;
        let event_vector = EventVector::new(event_codes);
        let today = day_index(self.clock.now());

        for report in &metric.reports {
            if !RegistryValidator::is_valid(metric, report) {
                continue;
            }
            if report.report_type != ReportType::StringCounts {
                continue;
            }
            self.data_service
                .aggregate_string(
                    self.report_key(metric_id, report.id),
                    today,
                    &self.system_profile,
                    event_vector.clone(),
                    report.event_vector_buffer_max,
                    report.string_buffer_max,
                    value,
                )
                .await?;
        }
        Ok(())
    }

    fn metric(&self, metric_id: u32, expected: MetricType) -> Result<&MetricDefinition> {
        let metric = self.registry.metric(metric_id).ok_or_else(|| {
            Error::invalid_argument(format!("metric {metric_id} is not in the registry"))
        })?;
        if metric.metric_type != expected {
            return Err(Error::invalid_argument(format!(
                "metric {metric_id} is not a {expected:?} metric"
            )));
        }
        Ok(metric)
    }

    fn report_key(&self, metric_id: u32, report_id: u32) -> ReportKey {
        ReportKey::new(
            self.registry.customer_id,
            self.registry.project_id,
            metric_id,
            report_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobalt_core::{
        FakeClock, MetricDimension, PrivacyMechanism, ReportDefinition, StringListEntry,
    };
    use cobalt_store::MemoryStore;
    use cobalt_telemetry::NoOpOperationLogger;
    use chrono::{TimeZone, Utc};

    fn registry() -> Registry {
        Registry {
            customer_id: 1,
            project_id: 2,
            metrics: vec![
                MetricDefinition {
                    id: 3,
                    metric_type: MetricType::Occurrence,
                    dimensions: vec![MetricDimension {
                        event_codes: vec![5, 6],
                        max_event_code: None,
                    }],
                    reports: vec![ReportDefinition {
                        id: 4,
                        report_type: ReportType::FleetwideOccurrenceCounts,
                        privacy_mechanism: PrivacyMechanism::DeIdentification,
                        min_value: 0,
                        max_value: 0,
                        num_index_points: 0,
                        poisson_mean: 0.0,
                        event_vector_buffer_max: 0,
                        string_buffer_max: 0,
                    }],
                },
                MetricDefinition {
                    id: 7,
                    metric_type: MetricType::String,
                    dimensions: vec![],
                    reports: vec![ReportDefinition {
                        id: 8,
                        report_type: ReportType::StringCounts,
                        privacy_mechanism: PrivacyMechanism::DeIdentification,
                        min_value: 0,
                        max_value: 0,
                        num_index_points: 0,
                        poisson_mean: 0.0,
                        event_vector_buffer_max: 0,
                        string_buffer_max: 0,
                    }],
                },
            ],
        }
    }

    fn logger(enabled: bool) -> (CobaltLogger<MemoryStore>, Arc<DataService<MemoryStore>>) {
        let data_service = Arc::new(DataService::new(
            MemoryStore::new(),
            Arc::new(NoOpOperationLogger),
        ));
        let clock = Arc::new(FakeClock::new(
            Utc.with_ymd_and_hms(2022, 7, 28, 12, 0, 0).unwrap(),
        ));
        let logger = CobaltLogger::new(
            data_service.clone(),
            registry(),
            SystemProfile::default(),
            clock,
            enabled,
        );
        (logger, data_service)
    }

    #[tokio::test]
    async fn occurrence_events_reach_the_store() {
        let (logger, data_service) = logger(true);
        logger.log_occurrence(3, 2, vec![5]).await.unwrap();
        logger.log_occurrence(3, 1, vec![5]).await.unwrap();

        // 2022-07-28 is day index 19201.
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        data_service
            .generate_observations(ReportKey::new(1, 2, 3, 4), 19201, 0, move |day_index| {
                RecordingGenerator { day_index, seen: seen_clone.clone() }
            })
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec![(19201, 3)]);
    }

    #[tokio::test]
    async fn disabled_logger_drops_events() {
        let (logger, data_service) = logger(false);
        logger.log_occurrence(3, 2, vec![5]).await.unwrap();

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        data_service
            .generate_observations(ReportKey::new(1, 2, 3, 4), 19201, 0, move |day_index| {
                RecordingGenerator { day_index, seen: seen_clone.clone() }
            })
            .await
            .unwrap();
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn string_events_require_a_string_metric() {
        let (logger, _) = logger(true);
        assert!(logger.log_string(3, "value", vec![5]).await.is_err());
        assert!(logger.log_string(7, "value", vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_metric_is_rejected() {
        let (logger, _) = logger(true);
        assert!(logger.log_occurrence(99, 1, vec![5]).await.is_err());
    }

    /// Records the total stored count per generated day.
    struct RecordingGenerator {
        day_index: u32,
        seen: Arc<parking_lot::Mutex<Vec<(u32, i64)>>>,
    }

    impl cobalt_core::ObservationGenerator for RecordingGenerator {
        fn generate_observations(
            &mut self,
            day_index: u32,
            events: &cobalt_core::observation::EventsBySystemProfile,
            _string_hash_list: &[StringListEntry],
        ) -> Result<Vec<cobalt_core::ObservationBatch>> {
            assert_eq!(day_index, self.day_index);
            let total: i64 = events
                .iter()
                .flat_map(|(_, records)| records)
                .map(|record| record.aggregate_value.count())
                .sum();
            if total > 0 {
                self.seen.lock().push((day_index, total));
            }
            Ok(vec![])
        }
    }
}
