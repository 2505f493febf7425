//! Day-boundary generation pass and upload-queue access.

use cobalt_core::{day_index, Clock, Registry, RegistryValidator, ReportKey, Result};
use cobalt_observations::ObservationGeneratorFactory;
use cobalt_store::{DaoBuildingBlocks, DataService, StoredObservationBatch};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::info;

/// The once-per-day job host code schedules.
///
/// Generates observations for every valid report in the registry, exposes
/// the upload queue, and prunes stored data past the retention horizon. The
/// host scheduler guarantees at most one pass runs at a time.
pub struct CobaltPeriodicJob<D> {
    data_service: Arc<DataService<D>>,
    registry: Registry,
    factory: ObservationGeneratorFactory,
    clock: Arc<dyn Clock>,
    retention_days: u32,
}

impl<D: DaoBuildingBlocks> CobaltPeriodicJob<D> {
    pub fn new(
        data_service: Arc<DataService<D>>,
        registry: Registry,
        factory: ObservationGeneratorFactory,
        clock: Arc<dyn Clock>,
        retention_days: u32,
    ) -> Self {
        Self {
            data_service,
            registry,
            factory,
            clock,
            retention_days,
        }
    }

    /// Generate observations for every valid report, through yesterday.
    ///
    /// Today's aggregates stay in the store until the day is complete; the
    /// most recent day eligible for generation is always yesterday.
    pub async fn generate_observations(&self) -> Result<()> {
        let now = self.clock.now();
        let most_recent_day_index = day_index(now).saturating_sub(1);
        let enabled_time = self.data_service.logger_enabled(now).await?;
        let day_index_logger_enabled = day_index(enabled_time);
        info!(
            most_recent_day_index,
            day_index_logger_enabled, "Starting observation generation pass"
        );

        for (metric, report) in self.registry.metric_reports() {
            if !RegistryValidator::is_valid(metric, report) {
                continue;
            }
            let report_key = self.report_key(metric.id, report.id);
            let metric = metric.clone();
            let report = report.clone();
            let factory = &self.factory;
            self.data_service
                .generate_observations(
                    report_key,
                    most_recent_day_index,
                    day_index_logger_enabled,
                    move |_day_index| {
                        factory.generator_for(report_key, &metric, &report, StdRng::from_entropy())
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Queued observation batches, oldest first.
    pub async fn observations_to_send(&self) -> Result<Vec<StoredObservationBatch>> {
        self.data_service.oldest_observations_to_send().await
    }

    /// Delete batches after the uploader confirms the send.
    pub async fn mark_sent(&self, observation_ids: &[u64]) -> Result<()> {
        self.data_service
            .remove_sent_observations(observation_ids)
            .await
    }

    /// Delete aggregates past retention and state for reports no longer in
    /// the registry.
    pub async fn cleanup(&self) -> Result<()> {
        let oldest_day_index =
            day_index(self.clock.now()).saturating_sub(self.retention_days);
        let relevant: Vec<ReportKey> = self
            .registry
            .metric_reports()
            .map(|(metric, report)| self.report_key(metric.id, report.id))
            .collect();
        self.data_service.cleanup(&relevant, oldest_day_index).await
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
