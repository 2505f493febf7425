//! Private index calculations.
//!
//! Maps logged values and event vectors into the combined private index
//! space reported by shuffled-DP reports.

use cobalt_core::{Error, EventVector, MetricDefinition, MetricDimension, ReportDefinition, Result};
use rand::Rng;

/// Clip `value` to the report's `[min_value, max_value]` range, inclusive.
pub fn clip_value(value: i64, report: &ReportDefinition) -> i64 {
    value.clamp(report.min_value, report.max_value)
}

/// Map `value` to an index in `[0, num_index_points - 1]` with unbiased
/// randomized rounding.
///
/// The value range `[min_value, max_value]` is divided into
/// `num_index_points - 1` equal intervals. A value between two index points
/// rounds up with probability proportional to its distance from the lower
/// point, so repeated calls reconstruct the true value in expectation.
/// `value == max_value` always yields the top index and `value == min_value`
/// always yields 0.
pub fn double_to_index<R: Rng + ?Sized>(
    value: f64,
    min_value: f64,
    max_value: f64,
    num_index_points: u32,
    rng: &mut R,
) -> Result<u32> {
    if num_index_points == 0 {
        return Err(Error::invalid_argument("num_index_points must be positive"));
    }
    if !(min_value < max_value) {
        return Err(Error::invalid_argument(format!(
            "min_value ({min_value}) must be less than max_value ({max_value})"
        )));
    }
    if num_index_points == 1 {
        return Ok(0);
    }

    let value = value.clamp(min_value, max_value);
    let interval_size = (max_value - min_value) / f64::from(num_index_points - 1);
    let approx_index = (value - min_value) / interval_size;
    let lower_index = approx_index.floor();

    // Floating point can overshoot at the top of the range; never round past
    // the last index point.
    if lower_index >= f64::from(num_index_points - 1) {
        return Ok(num_index_points - 1);
    }

    let distance = approx_index - lower_index;
    let lower_index = lower_index as u32;
    if rng.gen::<f64>() < distance {
        Ok(lower_index + 1)
    } else {
        Ok(lower_index)
    }
}

/// Total number of event vectors the metric's dimensions can express: the
/// product of per-dimension cardinalities. An empty dimension list yields 1.
pub fn num_event_vectors(dimensions: &[MetricDimension]) -> u64 {
    dimensions.iter().map(|d| d.cardinality()).product()
}

/// Mixed-radix positional encoding of an event vector.
///
/// Each code is mapped to its zero-based rank within its dimension's code
/// space, then ranks are combined with per-dimension cardinalities as the
/// radices, first dimension varying fastest. The image of the full
/// event-vector space is exactly `0..num_event_vectors(dimensions)`.
pub fn event_vector_to_index(event_vector: &EventVector, metric: &MetricDefinition) -> Result<u64> {
    let dimensions = &metric.dimensions;
    if event_vector.len() != dimensions.len() {
        return Err(Error::invalid_argument(format!(
            "event vector {} has {} dimensions, metric {} has {}",
            event_vector,
            event_vector.len(),
            metric.id,
            dimensions.len()
        )));
    }

    let mut index = 0u64;
    let mut multiplier = 1u64;
    for (code, dimension) in event_vector.codes().iter().zip(dimensions) {
        let rank = dimension.rank(*code).ok_or_else(|| {
            Error::invalid_argument(format!(
                "event code {code} is not in the code space of metric {}",
                metric.id
            ))
        })?;
        index += rank * multiplier;
        multiplier *= dimension.cardinality();
    }
    Ok(index)
}
