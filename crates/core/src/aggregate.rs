//! Aggregate values stored per (report, day, event vector, system profile).

use serde::{Deserialize, Serialize};

/// One bucket of a locally aggregated index histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub index: u32,
    pub count: i64,
}

/// The value accumulated for one aggregate-store row.
///
/// Either a plain integer counter or an index histogram with one entry per
/// distinct bucket index. Bucket order is irrelevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateValue {
    Count(i64),
    IndexHistogram(Vec<HistogramBucket>),
}

impl AggregateValue {
    /// The integer counter, or 0 for histogram values.
    pub fn count(&self) -> i64 {
        match self {
            Self::Count(count) => *count,
            Self::IndexHistogram(_) => 0,
        }
    }

    /// The histogram buckets, empty for counter values.
    pub fn buckets(&self) -> &[HistogramBucket] {
        match self {
            Self::Count(_) => &[],
            Self::IndexHistogram(buckets) => buckets,
        }
    }
}
