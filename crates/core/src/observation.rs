//! Wire-ready observation payloads and batches.
//!
//! Observations are what leaves the device: encoded, anonymized snapshots of
//! one day's aggregates. The concrete transport encoding (protobuf, upload
//! envelope, encryption) is owned by external collaborators; these types are
//! the serde-serializable payloads handed to them.

use crate::error::Result;
use crate::event::{EventRecord, EventVector};
use crate::report::ReportKey;
use crate::string_hash::{StringHash, StringListEntry};
use crate::system_profile::SystemProfile;
use serde::{Deserialize, Serialize};

/// Length of the per-observation random identifier.
pub const RANDOM_ID_LEN: usize = 8;

/// One (event vector, value) pair of an integer observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerObservationValue {
    pub event_codes: Vec<u32>,
    pub value: i64,
}

/// De-identified integer counts for every event vector seen in one
/// report/day/profile group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegerObservation {
    pub values: Vec<IntegerObservationValue>,
}

/// A single combined index encoding both a randomized-rounded value and an
/// event vector position. Under shuffled DP each index is reported in its
/// own observation so fabricated and real entries are indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateIndexObservation {
    pub index: u64,
}

/// Per-event histogram over positions in the shared string hash list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHistogram {
    pub event_codes: Vec<u32>,
    pub bucket_indices: Vec<u32>,
    pub bucket_counts: Vec<i64>,
}

/// String histograms for one report/day/profile group plus the shared,
/// compacted list of string hashes the bucket indices refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringHistogramObservation {
    pub string_hashes_ff64: Vec<StringHash>,
    pub string_histograms: Vec<IndexHistogram>,
}

/// The encoding strategies an observation payload can use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationPayload {
    Integer(IntegerObservation),
    PrivateIndex(PrivateIndexObservation),
    StringHistogram(StringHistogramObservation),
}

/// One encoded observation plus the random identifier attached for
/// unlinkability across uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub payload: ObservationPayload,
    pub random_id: [u8; RANDOM_ID_LEN],
}

/// A day/report/system-profile-scoped collection of encoded observations.
/// Immutable once created; queued for upload and deleted after send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationBatch {
    pub report_key: ReportKey,
    pub day_index: u32,
    pub system_profile: SystemProfile,
    pub observations: Vec<Observation>,
}

impl ObservationBatch {
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }
}

/// A day's stored event records grouped by the system profile they were
/// logged under.
pub type EventsBySystemProfile = Vec<(SystemProfile, Vec<EventRecord>)>;

/// Converts one day's aggregated event records into observation batches.
///
/// Implementations own their randomness (injected at construction) so a
/// generation pass is replayable under test. `string_hash_list` carries the
/// stable string-hash assignments for the report/day; generators that do not
/// encode strings ignore it.
pub trait ObservationGenerator: Send {
    fn generate_observations(
        &mut self,
        day_index: u32,
        events: &EventsBySystemProfile,
        string_hash_list: &[StringListEntry],
    ) -> Result<Vec<ObservationBatch>>;
}

impl<G: ObservationGenerator + ?Sized> ObservationGenerator for Box<G> {
    fn generate_observations(
        &mut self,
        day_index: u32,
        events: &EventsBySystemProfile,
        string_hash_list: &[StringListEntry],
    ) -> Result<Vec<ObservationBatch>> {
        (**self).generate_observations(day_index, events, string_hash_list)
    }
}

/// Group a flat list of event records by their system profile, preserving
/// first-seen profile order and per-profile record order.
pub fn group_by_system_profile(records: Vec<EventRecord>) -> EventsBySystemProfile {
    let mut groups: EventsBySystemProfile = Vec::new();
    for record in records {
        match groups.iter_mut().find(|(p, _)| *p == record.system_profile) {
            Some((_, group)) => group.push(record),
            None => groups.push((record.system_profile.clone(), vec![record])),
        }
    }
    groups
}

/// Helper for generators: the event vector of a record as owned codes.
pub fn event_codes_of(vector: &EventVector) -> Vec<u32> {
    vector.codes().to_vec()
}
