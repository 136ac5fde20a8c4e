//! Reference maximum estimation
//!
//! The reference maximum is the denominator that scales a feature's raw
//! magnitude into `[0, 1]`. It is taken from the feature's own active
//! (strictly positive) population so a handful of extreme outliers cannot
//! compress everyone else's severity toward zero.

use serde::{Deserialize, Serialize};

use crate::config::ReferenceMaxConfig;
use crate::utils::stats;

/// Smallest denominator the estimator will ever return
pub const MIN_REFERENCE_MAX: f64 = 1.0;

/// How a reference maximum was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMethod {
    /// Percentile of the active population
    Percentile,
    /// Percentile was not positive; fell back to the active maximum
    DegeneratePercentile,
    /// Too few active values for a stable percentile; used the active maximum
    SparseMaximum,
    /// No active values at all
    NoActiveValues,
}

/// A reference maximum together with the method that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMax {
    pub value: f64,
    pub method: ReferenceMethod,
    /// Number of strictly positive values considered
    pub active_count: usize,
}

/// Estimate the reference maximum for one feature's values
///
/// The result is never below [`MIN_REFERENCE_MAX`].
#[must_use]
pub fn reference_max(values: &[f64], config: &ReferenceMaxConfig) -> ReferenceMax {
    let active: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    let active_count = active.len();

    let (raw, method) = if active.is_empty() {
        (MIN_REFERENCE_MAX, ReferenceMethod::NoActiveValues)
    } else if active_count >= config.min_samples {
        match stats::percentile(&active, config.percentile) {
            Some(p) if p > 0.0 => (p, ReferenceMethod::Percentile),
            _ => (stats::max(&active), ReferenceMethod::DegeneratePercentile),
        }
    } else {
        (stats::max(&active), ReferenceMethod::SparseMaximum)
    };

    ReferenceMax {
        value: raw.max(MIN_REFERENCE_MAX),
        method,
        active_count,
    }
}
