//! Order-independent descriptive statistics
//!
//! Every reduction sorts its input first so the result is bit-identical for
//! any permutation of the same values.

use std::cmp::Ordering;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Sum of `values`, independent of their order
#[must_use]
pub fn ordered_sum(values: &[f64]) -> f64 {
    sorted(values).iter().sum()
}

/// Arithmetic mean, or 0 for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        ordered_sum(values) / values.len() as f64
    }
}

/// Largest value, or 0 for an empty slice
#[must_use]
pub fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .max_by(f64::total_cmp)
        .unwrap_or(0.0)
}

/// Percentile with linear interpolation between closest ranks
///
/// `p` is a fraction in `[0, 1]`. Returns `None` for an empty slice.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let data = sorted(values);
    let p = p.clamp(0.0, 1.0);
    let rank = p * (data.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    match data[lower].partial_cmp(&data[upper]) {
        Some(Ordering::Equal) | None => Some(data[lower]),
        _ => Some(data[lower] + (data[upper] - data[lower]) * fraction),
    }
}
