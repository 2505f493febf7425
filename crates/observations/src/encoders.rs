//! Encoders from aggregate values to observation payloads.

use cobalt_core::{
    AggregateValue, EventRecord, EventVector, IndexHistogram, IntegerObservation,
    IntegerObservationValue, MetricDefinition, Observation, ObservationPayload, ReportDefinition,
    Result, StringHistogramObservation, StringListEntry, RANDOM_ID_LEN,
};
use cobalt_privacy::{clip_value, double_to_index, event_vector_to_index, num_event_vectors};
use rand::Rng;
use std::collections::BTreeMap;

/// Random identifier attached to every observation for unlinkability across
/// uploads.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> [u8; RANDOM_ID_LEN] {
    let mut id = [0u8; RANDOM_ID_LEN];
    rng.fill_bytes(&mut id);
    id
}

/// De-identified integer counts: one observation listing an
/// (event codes, value) pair per input record.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerEncoder;

impl IntegerEncoder {
    pub fn encode<R: Rng + ?Sized>(&self, records: &[EventRecord], rng: &mut R) -> Observation {
        let values = records
            .iter()
            .map(|record| IntegerObservationValue {
                event_codes: record.event_vector.codes().to_vec(),
                value: record.aggregate_value.count(),
            })
            .collect();
        Observation {
            payload: ObservationPayload::Integer(IntegerObservation { values }),
            random_id: random_id(rng),
        }
    }
}

/// Combined private index encoding for shuffled-DP occurrence reports.
///
/// The clipped value is randomized-rounded to a value index and combined
/// with the event vector's position: the value varies slowest, the event
/// vector fastest.
#[derive(Debug, Clone, Copy)]
pub struct PrivateIntegerEncoder<'a> {
    metric: &'a MetricDefinition,
    report: &'a ReportDefinition,
}

impl<'a> PrivateIntegerEncoder<'a> {
    pub fn new(metric: &'a MetricDefinition, report: &'a ReportDefinition) -> Self {
        Self { metric, report }
    }

    /// The private index for one (event vector, aggregate value) pair.
    pub fn encode<R: Rng + ?Sized>(
        &self,
        event_vector: &EventVector,
        value: &AggregateValue,
        rng: &mut R,
    ) -> Result<u64> {
        let clipped = clip_value(value.count(), self.report);
        let value_index = double_to_index(
            clipped as f64,
            self.report.min_value as f64,
            self.report.max_value as f64,
            self.report.num_index_points,
            rng,
        )?;
        let event_vector_index = event_vector_to_index(event_vector, self.metric)?;
        let total_event_vectors = num_event_vectors(&self.metric.dimensions);
        Ok(u64::from(value_index) * total_event_vectors + event_vector_index)
    }
}

/// String histograms over positions in the compacted string hash list.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringHistogramEncoder;

impl StringHistogramEncoder {
    /// Encode one report/day/profile group of string-count records.
    ///
    /// The output hash list is sorted by assigned list index with gaps
    /// compacted, so bucket indices in the output are positions in that
    /// list, not the stored list indices. Buckets referencing a hash that is
    /// not in the list and buckets with a non-positive count are excluded;
    /// repeated buckets for one index are summed.
    pub fn encode<R: Rng + ?Sized>(
        &self,
        records: &[EventRecord],
        string_hash_list: &[StringListEntry],
        rng: &mut R,
    ) -> Observation {
        let mut entries = string_hash_list.to_vec();
        entries.sort_by_key(|entry| entry.list_index);
        let position_of = |list_index: u32| {
            entries
                .iter()
                .position(|entry| entry.list_index == list_index)
        };

        let string_histograms = records
            .iter()
            .map(|record| {
                let mut counts_by_position: BTreeMap<u32, i64> = BTreeMap::new();
                for bucket in record.aggregate_value.buckets() {
                    if bucket.count <= 0 {
                        continue;
                    }
                    let Some(position) = position_of(bucket.index) else {
                        continue;
                    };
                    *counts_by_position.entry(position as u32).or_insert(0) += bucket.count;
                }
                IndexHistogram {
                    event_codes: record.event_vector.codes().to_vec(),
                    bucket_indices: counts_by_position.keys().copied().collect(),
                    bucket_counts: counts_by_position.values().copied().collect(),
                }
            })
            .collect();

        Observation {
            payload: ObservationPayload::StringHistogram(StringHistogramObservation {
                string_hashes_ff64: entries.iter().map(|entry| entry.hash).collect(),
                string_histograms,
            }),
            random_id: random_id(rng),
        }
    }
}
