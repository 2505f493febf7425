//! Shuffled-DP noise generation.
//!
//! Real private indices are diluted with fabricated ones before upload: for
//! every possible index value a Poisson-distributed number of fabricated
//! copies is appended, so any single index's presence in the final unordered
//! multiset is statistically inconclusive about whether it was real.

use cobalt_core::{Error, PrivateIndexObservation, ReportDefinition, Result};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Append fabricated indices to `real_indices`.
///
/// For each of the `max_index + 1` possible index values, draws a Poisson
/// count with mean `report.poisson_mean` and appends that many copies of the
/// index, producing `(max_index + 1) * poisson_mean` fabricated entries in
/// expectation.
pub fn add_noise<R: Rng + ?Sized>(
    real_indices: Vec<u64>,
    max_index: i64,
    report: &ReportDefinition,
    rng: &mut R,
) -> Result<Vec<u64>> {
    if max_index < 0 {
        return Err(Error::invalid_argument(format!(
            "max_index must be non-negative, got {max_index}"
        )));
    }
    if report.poisson_mean < 0.0 {
        return Err(Error::invalid_argument(format!(
            "poisson_mean must be non-negative, got {}",
            report.poisson_mean
        )));
    }

    let mut indices = real_indices;
    if report.poisson_mean == 0.0 {
        // Poisson(0) is identically zero: no fabricated entries.
        return Ok(indices);
    }

    let poisson = Poisson::new(report.poisson_mean)
        .map_err(|e| Error::invalid_argument(format!("poisson_mean: {e}")))?;
    for index in 0..=(max_index as u64) {
        let fabricated = poisson.sample(rng) as u64;
        for _ in 0..fabricated {
            indices.push(index);
        }
    }
    Ok(indices)
}

/// Fabricated-only noise for the no-real-events case.
///
/// Used by the private pipeline to emit cover traffic for a report/day with
/// no logged events, so the absence of an upload does not leak that nothing
/// happened.
pub fn generate_noise<R: Rng + ?Sized>(
    max_index: i64,
    report: &ReportDefinition,
    rng: &mut R,
) -> Result<Vec<PrivateIndexObservation>> {
    Ok(add_noise(Vec::new(), max_index, report, rng)?
        .into_iter()
        .map(|index| PrivateIndexObservation { index })
        .collect())
}
