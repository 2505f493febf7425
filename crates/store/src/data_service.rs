//! Essential operations over the aggregate store.
//!
//! Each public method is one atomic unit of work: the store is held for the
//! whole read-modify-write so concurrent increments for the same key never
//! lose updates. A database-backed `DaoBuildingBlocks` would map the same
//! units onto database transactions.

use crate::aggregators::{count_aggregator, string_index_aggregator, LogAggregator};
use crate::dao::{DaoBuildingBlocks, GlobalValueKey, StoredObservationBatch};
use chrono::{DateTime, Duration, Utc};
use cobalt_core::{
    string_hash_ff64, AggregateValue, DayIndex, Error, EventVector, ObservationBatch,
    ObservationGenerator, ReportKey, Result, StringListEntry, SystemProfile,
};
use cobalt_core::observation::group_by_system_profile;
use cobalt_telemetry::{metrics, OperationLogger};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// The logger resets and doesn't backfill if it was disabled for more than
/// 2 days: at least one full day passed with the logger off, so no complete
/// day of data should be sent from before the gap.
const DISABLED_RESET: Duration = Duration::days(2);

/// Observations older than this many days are dropped by the server, so
/// backfill never reaches further back.
const MAX_BACKFILL_DAYS: u32 = 3;

/// Provides essential operations for interacting with Cobalt's store.
pub struct DataService<D> {
    dao: Arc<Mutex<D>>,
    op_logger: Arc<dyn OperationLogger>,
}

impl<D: DaoBuildingBlocks> DataService<D> {
    pub fn new(dao: D, op_logger: Arc<dyn OperationLogger>) -> Self {
        Self {
            dao: Arc::new(Mutex::new(dao)),
            op_logger,
        }
    }

    /// Record that the logger is currently disabled.
    pub async fn logger_disabled(&self, current_time: DateTime<Utc>) -> Result<()> {
        let mut dao = self.dao.lock();
        dao.insert_global_value(GlobalValueKey::InitialDisabledTime, &current_time.to_rfc3339())
    }

    /// Record that the logger is currently enabled and determine how far
    /// back to backfill.
    ///
    /// Returns the time the logger was initially enabled since the last
    /// disabling, resetting to `current_time` if the logger was disabled for
    /// longer than the reset window.
    pub async fn logger_enabled(&self, current_time: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut dao = self.dao.lock();

        let mut initial_enabled =
            query_time(&*dao, GlobalValueKey::InitialEnabledTime)?;
        let start_disabled = query_time(&*dao, GlobalValueKey::InitialDisabledTime)?;

        if let Some(disabled_at) = start_disabled {
            // The logger was disabled; this is the first run since it was
            // re-enabled.
            if current_time - disabled_at > DISABLED_RESET {
                initial_enabled = None;
            }
            dao.delete_global_value(GlobalValueKey::InitialDisabledTime)?;
        }

        match initial_enabled {
            Some(enabled_at) => Ok(enabled_at),
            None => {
                dao.insert_or_replace_global_value(
                    GlobalValueKey::InitialEnabledTime,
                    &current_time.to_rfc3339(),
                )?;
                Ok(current_time)
            }
        }
    }

    /// Updates the aggregated data for an occurrence-count report in
    /// response to an event.
    ///
    /// If a row already exists for (report, day, event vector) under this
    /// system profile, `count` is added to it; otherwise a new row is
    /// created subject to the event-vector buffer cap. Only the report-all
    /// system profile selection policy is supported.
    pub async fn aggregate_count(
        &self,
        report_key: ReportKey,
        day_index: DayIndex,
        system_profile: &SystemProfile,
        event_vector: EventVector,
        event_vector_buffer_max: u64,
        count: i64,
    ) -> Result<()> {
        let mut dao = self.dao.lock();
        self.aggregate_value_report_all(
            &mut *dao,
            report_key,
            day_index,
            system_profile,
            &event_vector,
            event_vector_buffer_max,
            count,
            &count_aggregator(),
        )?;
        metrics().events_aggregated.inc();
        Ok(())
    }

    /// Updates the aggregated data for a string-count report in response to
    /// an event.
    ///
    /// The string is hashed and assigned a stable per-report/day list index;
    /// the aggregate histogram bucket for that index is incremented. The
    /// string is dropped if the string buffer is full, and the event vector
    /// is subject to the same buffer cap as counts.
    pub async fn aggregate_string(
        &self,
        report_key: ReportKey,
        day_index: DayIndex,
        system_profile: &SystemProfile,
        event_vector: EventVector,
        event_vector_buffer_max: u64,
        string_buffer_max: u64,
        string_value: &str,
    ) -> Result<()> {
        let mut dao = self.dao.lock();
        let hash = string_hash_ff64(string_value);
        let Some(list_index) =
            dao.query_string_list_index(report_key, day_index, string_buffer_max, hash)?
        else {
            self.op_logger
                .string_buffer_max_exceeded(report_key.metric_id, report_key.report_id);
            return Ok(());
        };

        let written = self.aggregate_value_report_all(
            &mut *dao,
            report_key,
            day_index,
            system_profile,
            &event_vector,
            event_vector_buffer_max,
            list_index,
            &string_index_aggregator(),
        )?;
        if written {
            // The list index was written into an aggregate row; make sure
            // the hash it refers to is in the string hash table.
            dao.insert_string_hash(report_key, day_index, StringListEntry::new(list_index, hash))?;
        }
        metrics().events_aggregated.inc();
        Ok(())
    }

    /// Generate the observations for a report.
    ///
    /// Runs as one unit of work so multiple observations are never generated
    /// for the same event data: reads the last sent day index, loads each
    /// outstanding day's aggregates grouped by system profile, runs the
    /// generator, stores the resulting batches, and advances the last sent
    /// day index.
    pub async fn generate_observations<G, F>(
        &self,
        report_key: ReportKey,
        most_recent_day_index: DayIndex,
        day_index_logger_enabled: DayIndex,
        mut generator_supplier: F,
    ) -> Result<()>
    where
        G: ObservationGenerator,
        F: FnMut(DayIndex) -> G,
    {
        let mut dao = self.dao.lock();
        let next_day_index = self.next_day_index_to_aggregate(
            &mut *dao,
            report_key,
            most_recent_day_index,
            day_index_logger_enabled,
        )?;

        let mut generated: Vec<ObservationBatch> = Vec::new();

        // All outstanding days, which is one day under normal circumstances.
        for day_index in next_day_index..=most_recent_day_index {
            info!(report = %report_key, day_index, "Generating observations");
            let records = dao.query_event_records_for_day(report_key, day_index)?;
            let events = group_by_system_profile(records);
            let string_hash_list = dao.query_string_hash_list(report_key, day_index)?;

            let mut generator = generator_supplier(day_index);
            let batches =
                generator.generate_observations(day_index, &events, &string_hash_list)?;

            let num_observations: usize = batches.iter().map(|b| b.observation_count()).sum();
            info!(
                report = %report_key,
                day_index,
                num_observations,
                num_batches = batches.len(),
                "Generated observations"
            );
            metrics().observations_generated.inc_by(num_observations as u64);
            metrics().batches_generated.inc_by(batches.len() as u64);
            generated.extend(batches);
        }

        dao.insert_observation_batches(generated)?;
        dao.update_last_sent_day_index(report_key, most_recent_day_index)?;
        metrics().generation_passes.inc();
        Ok(())
    }

    /// Delete data that is no longer needed: aggregates past retention,
    /// reports absent from the registry, and orphaned string hashes and
    /// system profiles.
    pub async fn cleanup(
        &self,
        relevant_reports: &[ReportKey],
        oldest_day_index: DayIndex,
    ) -> Result<()> {
        let mut dao = self.dao.lock();
        dao.delete_old_aggregates(oldest_day_index)?;
        let irrelevant: Vec<ReportKey> = dao
            .query_report_keys()?
            .into_iter()
            .filter(|r| !relevant_reports.contains(r))
            .collect();
        dao.delete_reports(&irrelevant)?;
        dao.delete_unused_string_hashes()?;
        dao.delete_unused_system_profiles()?;
        Ok(())
    }

    /// The observation batches waiting to be sent, oldest first.
    pub async fn oldest_observations_to_send(&self) -> Result<Vec<StoredObservationBatch>> {
        self.dao.lock().query_oldest_observations()
    }

    /// Delete observation batches that were successfully sent.
    pub async fn remove_sent_observations(&self, observation_ids: &[u64]) -> Result<()> {
        if observation_ids.is_empty() {
            return Ok(());
        }
        metrics()
            .batches_removed_after_send
            .inc_by(observation_ids.len() as u64);
        self.dao.lock().delete_observations(observation_ids)
    }

    /// Generic aggregation with a system profile selection policy of
    /// report-all.
    ///
    /// Returns whether a value was inserted or updated in the aggregate
    /// store.
    #[allow(clippy::too_many_arguments)]
    fn aggregate_value_report_all<A: LogAggregator>(
        &self,
        dao: &mut D,
        report_key: ReportKey,
        day_index: DayIndex,
        system_profile: &SystemProfile,
        event_vector: &EventVector,
        event_vector_buffer_max: u64,
        value: A::Value,
        aggregator: &A,
    ) -> Result<bool> {
        let system_profile_hash = system_profile.profile_hash();
        dao.insert_system_profile(system_profile_hash, system_profile)?;
        dao.insert_last_sent_day_index(report_key, day_index.saturating_sub(1))?;

        let existing = dao.query_one_system_profile_and_aggregate_value(
            report_key,
            day_index,
            event_vector,
            system_profile_hash,
        )?;

        let Some(existing) = existing else {
            // No aggregate value for this report, day, and event vector
            // combination; insert one.
            return self.insert_aggregate_row(
                dao,
                report_key,
                day_index,
                system_profile_hash,
                event_vector,
                event_vector_buffer_max,
                aggregator.initial_value(value),
            );
        };

        if existing.system_profile_hash == system_profile_hash {
            let merged = aggregator.merge_value(value, &existing.aggregate_value)?;
            dao.update_aggregate_value(
                report_key,
                day_index,
                event_vector,
                system_profile_hash,
                merged,
            )?;
            return Ok(true);
        }

        // All system profiles are reported; add a row for this one.
        self.insert_aggregate_row(
            dao,
            report_key,
            day_index,
            system_profile_hash,
            event_vector,
            event_vector_buffer_max,
            aggregator.initial_value(value),
        )
    }

    /// Insert a new aggregate row unless the event-vector buffer is full.
    ///
    /// Returns true if a value was inserted. The cap applies only here, on
    /// the insert path: updates to an already-stored event vector are never
    /// dropped.
    fn insert_aggregate_row(
        &self,
        dao: &mut D,
        report_key: ReportKey,
        day_index: DayIndex,
        system_profile_hash: u64,
        event_vector: &EventVector,
        event_vector_buffer_max: u64,
        new_value: AggregateValue,
    ) -> Result<bool> {
        if event_vector_buffer_max != 0 {
            let num_event_vectors =
                dao.query_count_event_vectors(report_key, day_index, system_profile_hash)?;
            if num_event_vectors >= event_vector_buffer_max {
                self.op_logger
                    .event_vector_buffer_max_exceeded(report_key.metric_id, report_key.report_id);
                return Ok(false);
            }
        }
        dao.insert_aggregate_value(
            report_key,
            day_index,
            event_vector,
            system_profile_hash,
            new_value,
        )?;
        Ok(true)
    }

    fn next_day_index_to_aggregate(
        &self,
        dao: &mut D,
        report_key: ReportKey,
        most_recent_day_index: DayIndex,
        day_index_logger_enabled: DayIndex,
    ) -> Result<DayIndex> {
        let last_sent = dao.query_last_sent_day_index(report_key)?;
        if last_sent.is_none() {
            // Report is missing. Store it with the most recent day index so
            // it can be updated at the end of the generation pass; a new
            // report never aggregates historical days.
            dao.insert_last_sent_day_index(report_key, most_recent_day_index)?;
        }

        let mut next_day_index = last_sent.unwrap_or(most_recent_day_index) + 1;

        // Older data is dropped by the server.
        let oldest_accepted = most_recent_day_index.saturating_sub(MAX_BACKFILL_DAYS);
        if next_day_index < oldest_accepted {
            next_day_index = oldest_accepted;
        }

        // Never generate for days before the logger was enabled.
        if next_day_index < day_index_logger_enabled {
            next_day_index = day_index_logger_enabled;
        }

        debug!(report = %report_key, next_day_index, "Next day index to aggregate");
        Ok(next_day_index)
    }
}

fn query_time(dao: &impl DaoBuildingBlocks, key: GlobalValueKey) -> Result<Option<DateTime<Utc>>> {
    match dao.query_global_value(key)? {
        None => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(&value)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| Error::corruption(format!("global value {key:?}: {e}"))),
    }
}
