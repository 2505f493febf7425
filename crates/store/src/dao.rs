//! Storage building blocks consumed by `DataService`.
//!
//! Implementations provide keyed access to aggregate rows, string hash
//! lists, system profiles, queued observation batches, and global values.
//! Every method is a single keyed operation; atomicity across calls is the
//! caller's responsibility (`DataService` serializes each logical unit of
//! work while holding the store).

use cobalt_core::{
    AggregateValue, DayIndex, EventRecord, EventVector, ObservationBatch, ReportKey, Result,
    StringHash, StringListEntry, SystemProfile,
};

/// Keys of the singleton global values the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GlobalValueKey {
    /// When the logger was first enabled since the last long disabling.
    InitialEnabledTime,
    /// When the logger was most recently disabled, if currently disabled.
    InitialDisabledTime,
}

/// An aggregate row's system profile hash and value, as returned by the
/// hinted lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemProfileAndAggregateValue {
    pub system_profile_hash: u64,
    pub aggregate_value: AggregateValue,
}

/// A queued observation batch plus the storage id used to delete it after a
/// confirmed send.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObservationBatch {
    pub id: u64,
    pub batch: ObservationBatch,
}

/// The keyed storage surface backing the aggregate store.
pub trait DaoBuildingBlocks: Send {
    /// Store a system profile under its hash. Idempotent.
    fn insert_system_profile(&mut self, hash: u64, profile: &SystemProfile) -> Result<()>;

    /// Record `day_index` as the last sent day for the report, only if the
    /// report has no entry yet. Idempotent.
    fn insert_last_sent_day_index(&mut self, report: ReportKey, day_index: DayIndex) -> Result<()>;

    /// Overwrite the last sent day for the report.
    fn update_last_sent_day_index(&mut self, report: ReportKey, day_index: DayIndex) -> Result<()>;

    fn query_last_sent_day_index(&self, report: ReportKey) -> Result<Option<DayIndex>>;

    /// Look up one aggregate row for (report, day, event vector).
    ///
    /// Prefers the row stored under `system_profile_hash_hint`; otherwise
    /// returns the row with the lowest hash, or `None` if the key tuple has
    /// no rows.
    fn query_one_system_profile_and_aggregate_value(
        &self,
        report: ReportKey,
        day_index: DayIndex,
        event_vector: &EventVector,
        system_profile_hash_hint: u64,
    ) -> Result<Option<SystemProfileAndAggregateValue>>;

    /// Insert a new aggregate row. The key tuple must not already exist.
    fn insert_aggregate_value(
        &mut self,
        report: ReportKey,
        day_index: DayIndex,
        event_vector: &EventVector,
        system_profile_hash: u64,
        value: AggregateValue,
    ) -> Result<()>;

    /// Replace the value of an existing aggregate row.
    fn update_aggregate_value(
        &mut self,
        report: ReportKey,
        day_index: DayIndex,
        event_vector: &EventVector,
        system_profile_hash: u64,
        value: AggregateValue,
    ) -> Result<()>;

    /// Number of distinct event vectors stored for (report, day, profile).
    /// Backs the event-vector buffer cap.
    fn query_count_event_vectors(
        &self,
        report: ReportKey,
        day_index: DayIndex,
        system_profile_hash: u64,
    ) -> Result<u64>;

    /// The list index assigned to `hash` for (report, day), or the next free
    /// index if the hash is new and the list is below `string_buffer_max`
    /// (0 = unlimited). `None` means the list is full and the string must be
    /// dropped. Does not write; a returned fresh index is only claimed once
    /// `insert_string_hash` runs.
    fn query_string_list_index(
        &self,
        report: ReportKey,
        day_index: DayIndex,
        string_buffer_max: u64,
        hash: StringHash,
    ) -> Result<Option<u32>>;

    /// Record a list-index assignment. Idempotent for an already-assigned
    /// hash.
    fn insert_string_hash(
        &mut self,
        report: ReportKey,
        day_index: DayIndex,
        entry: StringListEntry,
    ) -> Result<()>;

    fn query_string_hash_list(
        &self,
        report: ReportKey,
        day_index: DayIndex,
    ) -> Result<Vec<StringListEntry>>;

    /// All aggregate rows for (report, day) with their system profiles.
    /// Corrupt rows abort only themselves: they are skipped and counted.
    fn query_event_records_for_day(
        &self,
        report: ReportKey,
        day_index: DayIndex,
    ) -> Result<Vec<EventRecord>>;

    /// Queue finished observation batches for upload, preserving order.
    fn insert_observation_batches(&mut self, batches: Vec<ObservationBatch>) -> Result<()>;

    /// Queued batches in the order they were added.
    fn query_oldest_observations(&self) -> Result<Vec<StoredObservationBatch>>;

    /// Delete sent batches by storage id.
    fn delete_observations(&mut self, ids: &[u64]) -> Result<()>;

    /// Drop aggregate rows and string hash lists for days before
    /// `oldest_day_index`.
    fn delete_old_aggregates(&mut self, oldest_day_index: DayIndex) -> Result<()>;

    /// Every report key with any stored state.
    fn query_report_keys(&self) -> Result<Vec<ReportKey>>;

    /// Drop all state for the given reports.
    fn delete_reports(&mut self, reports: &[ReportKey]) -> Result<()>;

    /// Drop string hash lists whose (report, day) has no aggregate rows.
    fn delete_unused_string_hashes(&mut self) -> Result<()>;

    /// Drop system profiles not referenced by any aggregate row.
    fn delete_unused_system_profiles(&mut self) -> Result<()>;

    /// Store a global value only if the key is absent. Idempotent.
    fn insert_global_value(&mut self, key: GlobalValueKey, value: &str) -> Result<()>;

    fn insert_or_replace_global_value(&mut self, key: GlobalValueKey, value: &str) -> Result<()>;

    fn query_global_value(&self, key: GlobalValueKey) -> Result<Option<String>>;

    fn delete_global_value(&mut self, key: GlobalValueKey) -> Result<()>;
}
