//! In-memory implementation of the storage building blocks.
//!
//! Rows are held as serialized bytes, like a real backend would hold them,
//! so deserialization failures surface through the same corruption path a
//! database-backed store would hit. Used for tests and for embedders that
//! accept losing aggregates on process death.

use crate::dao::{
    DaoBuildingBlocks, GlobalValueKey, StoredObservationBatch, SystemProfileAndAggregateValue,
};
use cobalt_core::{
    AggregateValue, DayIndex, Error, EventRecord, EventVector, ObservationBatch, ReportKey, Result,
    StringHash, StringListEntry, SystemProfile,
};
use cobalt_telemetry::metrics;
use std::collections::BTreeMap;
use tracing::warn;

type AggregateKey = (ReportKey, DayIndex, EventVector, u64);

/// In-memory store. Not internally synchronized; `DataService` owns the
/// locking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    system_profiles: BTreeMap<u64, Vec<u8>>,
    aggregates: BTreeMap<AggregateKey, Vec<u8>>,
    string_hashes: BTreeMap<(ReportKey, DayIndex), Vec<StringListEntry>>,
    last_sent_day_indices: BTreeMap<ReportKey, DayIndex>,
    observations: BTreeMap<u64, Vec<u8>>,
    next_observation_id: u64,
    global_values: BTreeMap<GlobalValueKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aggregate rows currently stored. Test visibility only.
    pub fn aggregate_row_count(&self) -> usize {
        self.aggregates.len()
    }

    fn decode_profile(&self, hash: u64) -> Result<SystemProfile> {
        let bytes = self
            .system_profiles
            .get(&hash)
            .ok_or_else(|| Error::corruption(format!("missing system profile for hash {hash}")))?;
        serde_json::from_slice(bytes)
            .map_err(|e| Error::corruption(format!("system profile {hash}: {e}")))
    }

    fn decode_value(bytes: &[u8], key: &AggregateKey) -> Result<AggregateValue> {
        serde_json::from_slice(bytes).map_err(|e| {
            Error::corruption(format!(
                "aggregate value for report {} day {} event vector {}: {e}",
                key.0, key.1, key.2
            ))
        })
    }
}

impl DaoBuildingBlocks for MemoryStore {
    fn insert_system_profile(&mut self, hash: u64, profile: &SystemProfile) -> Result<()> {
        if !self.system_profiles.contains_key(&hash) {
            self.system_profiles.insert(hash, serde_json::to_vec(profile)?);
        }
        Ok(())
    }

    fn insert_last_sent_day_index(&mut self, report: ReportKey, day_index: DayIndex) -> Result<()> {
        self.last_sent_day_indices.entry(report).or_insert(day_index);
        Ok(())
    }

    fn update_last_sent_day_index(&mut self, report: ReportKey, day_index: DayIndex) -> Result<()> {
        self.last_sent_day_indices.insert(report, day_index);
        Ok(())
    }

    fn query_last_sent_day_index(&self, report: ReportKey) -> Result<Option<DayIndex>> {
        Ok(self.last_sent_day_indices.get(&report).copied())
    }

    fn query_one_system_profile_and_aggregate_value(
        &self,
        report: ReportKey,
        day_index: DayIndex,
        event_vector: &EventVector,
        system_profile_hash_hint: u64,
    ) -> Result<Option<SystemProfileAndAggregateValue>> {
        let range_start = (report, day_index, event_vector.clone(), u64::MIN);
        let range_end = (report, day_index, event_vector.clone(), u64::MAX);
        let mut lowest: Option<(&AggregateKey, &Vec<u8>)> = None;
        for (key, bytes) in self.aggregates.range(range_start..=range_end) {
            if key.3 == system_profile_hash_hint {
                return Ok(Some(SystemProfileAndAggregateValue {
                    system_profile_hash: key.3,
                    aggregate_value: Self::decode_value(bytes, key)?,
                }));
            }
            // Range iteration is hash-ordered, the first row has the lowest
            // hash.
            if lowest.is_none() {
                lowest = Some((key, bytes));
            }
        }
        match lowest {
            Some((key, bytes)) => Ok(Some(SystemProfileAndAggregateValue {
                system_profile_hash: key.3,
                aggregate_value: Self::decode_value(bytes, key)?,
            })),
            None => Ok(None),
        }
    }

    fn insert_aggregate_value(
        &mut self,
        report: ReportKey,
        day_index: DayIndex,
        event_vector: &EventVector,
        system_profile_hash: u64,
        value: AggregateValue,
    ) -> Result<()> {
        let key = (report, day_index, event_vector.clone(), system_profile_hash);
        if self.aggregates.contains_key(&key) {
            return Err(Error::store(format!(
                "aggregate row already exists for report {report} day {day_index} event vector {event_vector}"
            )));
        }
        self.aggregates.insert(key, serde_json::to_vec(&value)?);
        Ok(())
    }

    fn update_aggregate_value(
        &mut self,
        report: ReportKey,
        day_index: DayIndex,
        event_vector: &EventVector,
        system_profile_hash: u64,
        value: AggregateValue,
    ) -> Result<()> {
        let key = (report, day_index, event_vector.clone(), system_profile_hash);
        match self.aggregates.get_mut(&key) {
            Some(bytes) => {
                *bytes = serde_json::to_vec(&value)?;
                Ok(())
            }
            None => Err(Error::store(format!(
                "no aggregate row to update for report {report} day {day_index} event vector {event_vector}"
            ))),
        }
    }

    fn query_count_event_vectors(
        &self,
        report: ReportKey,
        day_index: DayIndex,
        system_profile_hash: u64,
    ) -> Result<u64> {
        let mut distinct = std::collections::BTreeSet::new();
        for (key, _) in self
            .aggregates
            .range((report, day_index, EventVector::new(vec![]), u64::MIN)..)
            .take_while(|(k, _)| k.0 == report && k.1 == day_index)
        {
            if key.3 == system_profile_hash {
                distinct.insert(&key.2);
            }
        }
        Ok(distinct.len() as u64)
    }

    fn query_string_list_index(
        &self,
        report: ReportKey,
        day_index: DayIndex,
        string_buffer_max: u64,
        hash: StringHash,
    ) -> Result<Option<u32>> {
        let list = self.string_hashes.get(&(report, day_index));
        if let Some(entries) = list {
            if let Some(entry) = entries.iter().find(|e| e.hash == hash) {
                return Ok(Some(entry.list_index));
            }
            let next = entries.len() as u64;
            if string_buffer_max != 0 && next >= string_buffer_max {
                return Ok(None);
            }
            return Ok(Some(next as u32));
        }
        // Empty list: index 0 is always free.
        Ok(Some(0))
    }

    fn insert_string_hash(
        &mut self,
        report: ReportKey,
        day_index: DayIndex,
        entry: StringListEntry,
    ) -> Result<()> {
        let entries = self.string_hashes.entry((report, day_index)).or_default();
        if !entries.iter().any(|e| e.hash == entry.hash) {
            entries.push(entry);
        }
        Ok(())
    }

    fn query_string_hash_list(
        &self,
        report: ReportKey,
        day_index: DayIndex,
    ) -> Result<Vec<StringListEntry>> {
        Ok(self
            .string_hashes
            .get(&(report, day_index))
            .cloned()
            .unwrap_or_default())
    }

    fn query_event_records_for_day(
        &self,
        report: ReportKey,
        day_index: DayIndex,
    ) -> Result<Vec<EventRecord>> {
        let mut records = Vec::new();
        for (key, bytes) in self
            .aggregates
            .range((report, day_index, EventVector::new(vec![]), u64::MIN)..)
            .take_while(|(k, _)| k.0 == report && k.1 == day_index)
        {
            let row = Self::decode_value(bytes, key)
                .and_then(|value| Ok((self.decode_profile(key.3)?, value)));
            match row {
                Ok((profile, value)) => {
                    records.push(EventRecord::new(profile, key.2.clone(), value));
                }
                Err(e) if e.is_row_scoped() => {
                    metrics().corrupt_rows_skipped.inc();
                    warn!(report = %report, day_index, error = %e, "Skipping corrupt aggregate row");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn insert_observation_batches(&mut self, batches: Vec<ObservationBatch>) -> Result<()> {
        for batch in batches {
            let id = self.next_observation_id;
            self.next_observation_id += 1;
            self.observations.insert(id, serde_json::to_vec(&batch)?);
        }
        Ok(())
    }

    fn query_oldest_observations(&self) -> Result<Vec<StoredObservationBatch>> {
        let mut stored = Vec::with_capacity(self.observations.len());
        for (&id, bytes) in &self.observations {
            let batch: ObservationBatch = serde_json::from_slice(bytes)
                .map_err(|e| Error::corruption(format!("observation batch {id}: {e}")))?;
            stored.push(StoredObservationBatch { id, batch });
        }
        Ok(stored)
    }

    fn delete_observations(&mut self, ids: &[u64]) -> Result<()> {
        for id in ids {
            self.observations.remove(id);
        }
        Ok(())
    }

    fn delete_old_aggregates(&mut self, oldest_day_index: DayIndex) -> Result<()> {
        self.aggregates.retain(|key, _| key.1 >= oldest_day_index);
        self.string_hashes.retain(|key, _| key.1 >= oldest_day_index);
        Ok(())
    }

    fn query_report_keys(&self) -> Result<Vec<ReportKey>> {
        Ok(self.last_sent_day_indices.keys().copied().collect())
    }

    fn delete_reports(&mut self, reports: &[ReportKey]) -> Result<()> {
        for report in reports {
            self.last_sent_day_indices.remove(report);
            self.aggregates.retain(|key, _| key.0 != *report);
            self.string_hashes.retain(|key, _| key.0 != *report);
        }
        Ok(())
    }

    fn delete_unused_string_hashes(&mut self) -> Result<()> {
        let live: std::collections::BTreeSet<(ReportKey, DayIndex)> =
            self.aggregates.keys().map(|k| (k.0, k.1)).collect();
        self.string_hashes.retain(|key, _| live.contains(key));
        Ok(())
    }

    fn delete_unused_system_profiles(&mut self) -> Result<()> {
        let live: std::collections::BTreeSet<u64> =
            self.aggregates.keys().map(|k| k.3).collect();
        self.system_profiles.retain(|hash, _| live.contains(hash));
        Ok(())
    }

    fn insert_global_value(&mut self, key: GlobalValueKey, value: &str) -> Result<()> {
        self.global_values.entry(key).or_insert_with(|| value.to_string());
        Ok(())
    }

    fn insert_or_replace_global_value(&mut self, key: GlobalValueKey, value: &str) -> Result<()> {
        self.global_values.insert(key, value.to_string());
        Ok(())
    }

    fn query_global_value(&self, key: GlobalValueKey) -> Result<Option<String>> {
        Ok(self.global_values.get(&key).cloned())
    }

    fn delete_global_value(&mut self, key: GlobalValueKey) -> Result<()> {
        self.global_values.remove(&key);
        Ok(())
    }
}
