//! Metric and report registry definitions.
//!
//! Only the fields the engine consumes are modeled; the authoritative
//! registry schema lives outside this repository and is deserialized into
//! these types.

mod validator;

pub use validator::RegistryValidator;

use serde::{Deserialize, Serialize};

/// One dimension of a metric: the space of event codes position `i` of an
/// event vector may take.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDimension {
    /// Explicitly enumerated event codes, in registry order. The order
    /// defines each code's zero-based rank for private index encoding.
    #[serde(default)]
    pub event_codes: Vec<u32>,
    /// If set, the dimension accepts all codes in `0..=max_event_code` and
    /// the code itself is its rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_event_code: Option<u32>,
}

impl MetricDimension {
    /// Number of distinct event codes this dimension accepts.
    pub fn cardinality(&self) -> u64 {
        match self.max_event_code {
            Some(max) => u64::from(max) + 1,
            None => self.event_codes.len() as u64,
        }
    }

    /// Zero-based rank of `code` within this dimension's code space.
    pub fn rank(&self, code: u32) -> Option<u64> {
        match self.max_event_code {
            Some(max) => (code <= max).then_some(u64::from(code)),
            None => self
                .event_codes
                .iter()
                .position(|&c| c == code)
                .map(|p| p as u64),
        }
    }
}

/// The kind of value a metric logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Occurrence,
    String,
}

/// How a report's values are anonymized before leaving the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyMechanism {
    DeIdentification,
    ShuffledDifferentialPrivacy,
}

/// The shape of the observations a report produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    FleetwideOccurrenceCounts,
    StringCounts,
}

/// The subset of a report configuration the engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub id: u32,
    pub report_type: ReportType,
    pub privacy_mechanism: PrivacyMechanism,
    /// Clipping bounds for privately encoded values.
    #[serde(default)]
    pub min_value: i64,
    #[serde(default)]
    pub max_value: i64,
    /// Number of index points the clipped value range is quantized into.
    #[serde(default)]
    pub num_index_points: u32,
    /// Mean fabricated-observation count per possible private index.
    #[serde(default)]
    pub poisson_mean: f64,
    /// Cap on distinct event vectors stored per report/day/profile.
    /// 0 = unlimited.
    #[serde(default)]
    pub event_vector_buffer_max: u64,
    /// Cap on distinct strings assigned list indices per report/day.
    /// 0 = unlimited.
    #[serde(default)]
    pub string_buffer_max: u64,
}

/// The subset of a metric configuration the engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: u32,
    pub metric_type: MetricType,
    #[serde(default)]
    pub dimensions: Vec<MetricDimension>,
    #[serde(default)]
    pub reports: Vec<ReportDefinition>,
}

/// The full registry for one customer/project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub customer_id: u32,
    pub project_id: u32,
    pub metrics: Vec<MetricDefinition>,
}

impl Registry {
    pub fn metric(&self, metric_id: u32) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|m| m.id == metric_id)
    }

    /// Every (metric, report) pair in the registry.
    pub fn metric_reports(&self) -> impl Iterator<Item = (&MetricDefinition, &ReportDefinition)> {
        self.metrics
            .iter()
            .flat_map(|m| m.reports.iter().map(move |r| (m, r)))
    }
}
