//! Percentile-of-active-scores-with-floor thresholds
//!
//! The one statistical method behind every classification level. Call
//! sites differ only in which members are eligible, the percentile, and
//! the floor.

use crate::utils::stats;

/// A threshold and the size of the population it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedThreshold {
    pub value: f64,
    /// Number of eligible members; 0 means the fallback was used
    pub population: usize,
}

/// `max(percentile(eligible scores, p), floor)`, or `floor * empty_multiplier`
/// when no score is eligible
#[must_use]
pub fn percentile_threshold(
    scores: &[f64],
    eligible: impl Fn(usize) -> bool,
    percentile: f64,
    floor: f64,
    empty_multiplier: f64,
) -> DerivedThreshold {
    let population: Vec<f64> = scores
        .iter()
        .enumerate()
        .filter(|(idx, _)| eligible(*idx))
        .map(|(_, score)| *score)
        .collect();

    match stats::percentile(&population, percentile) {
        Some(value) => DerivedThreshold {
            value: value.max(floor),
            population: population.len(),
        },
        None => DerivedThreshold {
            value: floor * empty_multiplier,
            population: 0,
        },
    }
}
