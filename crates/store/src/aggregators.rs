//! Merge strategies for aggregate values.
//!
//! A closed set of aggregator variants behind one capability interface:
//! produce the initial aggregate from one observed value, or merge one
//! observed value into an existing aggregate. Call sites operate purely on
//! the tagged `AggregateValue` union and never see the unwrapped
//! representation.

use cobalt_core::{AggregateValue, Error, HistogramBucket, Result};

/// Capability set of a log aggregator.
pub trait LogAggregator {
    /// The observed value being folded in.
    type Value: Copy;

    /// The aggregate for the first observed value of a key.
    fn initial_value(&self, value: Self::Value) -> AggregateValue;

    /// Merge one observed value into an existing aggregate. Merges only
    /// grow: the result is never smaller than the existing aggregate.
    fn merge_value(&self, value: Self::Value, existing: &AggregateValue)
        -> Result<AggregateValue>;
}

/// Integer counter aggregation for occurrence reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountAggregator;

impl LogAggregator for CountAggregator {
    type Value = i64;

    fn initial_value(&self, count: i64) -> AggregateValue {
        AggregateValue::Count(count)
    }

    fn merge_value(&self, count: i64, existing: &AggregateValue) -> Result<AggregateValue> {
        match existing {
            AggregateValue::Count(existing_count) => {
                Ok(AggregateValue::Count(existing_count.saturating_add(count)))
            }
            AggregateValue::IndexHistogram(_) => Err(Error::corruption(
                "count aggregation found a histogram aggregate value",
            )),
        }
    }
}

/// Histogram bucket increment keyed by a string's per-report/day list index.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringIndexAggregator;

impl LogAggregator for StringIndexAggregator {
    type Value = u32;

    fn initial_value(&self, list_index: u32) -> AggregateValue {
        AggregateValue::IndexHistogram(vec![HistogramBucket { index: list_index, count: 1 }])
    }

    fn merge_value(&self, list_index: u32, existing: &AggregateValue) -> Result<AggregateValue> {
        match existing {
            AggregateValue::IndexHistogram(buckets) => {
                let mut buckets = buckets.clone();
                match buckets.iter_mut().find(|b| b.index == list_index) {
                    Some(bucket) => bucket.count = bucket.count.saturating_add(1),
                    None => buckets.push(HistogramBucket { index: list_index, count: 1 }),
                }
                Ok(AggregateValue::IndexHistogram(buckets))
            }
            AggregateValue::Count(_) => Err(Error::corruption(
                "string index aggregation found a count aggregate value",
            )),
        }
    }
}

/// The aggregator for occurrence-count reports.
pub fn count_aggregator() -> CountAggregator {
    CountAggregator
}

/// The aggregator for string-count reports.
pub fn string_index_aggregator() -> StringIndexAggregator {
    StringIndexAggregator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_merge_adds() {
        let aggregator = count_aggregator();
        let initial = aggregator.initial_value(3);
        assert_eq!(initial, AggregateValue::Count(3));
        let merged = aggregator.merge_value(4, &initial).unwrap();
        assert_eq!(merged, AggregateValue::Count(7));
    }

    #[test]
    fn count_merge_rejects_histograms() {
        let aggregator = count_aggregator();
        let histogram = AggregateValue::IndexHistogram(vec![]);
        assert!(aggregator.merge_value(1, &histogram).is_err());
    }

    #[test]
    fn string_index_merge_increments_existing_bucket() {
        let aggregator = string_index_aggregator();
        let initial = aggregator.initial_value(2);
        let merged = aggregator.merge_value(2, &initial).unwrap();
        assert_eq!(
            merged,
            AggregateValue::IndexHistogram(vec![HistogramBucket { index: 2, count: 2 }])
        );
    }

    #[test]
    fn string_index_merge_creates_missing_bucket() {
        let aggregator = string_index_aggregator();
        let initial = aggregator.initial_value(0);
        let merged = aggregator.merge_value(3, &initial).unwrap();
        assert_eq!(merged.buckets().len(), 2);
        assert!(merged
            .buckets()
            .iter()
            .any(|b| b.index == 3 && b.count == 1));
    }
}
