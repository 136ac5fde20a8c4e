//! Aggregate-level risk classification
//!
//! Applied independently at site, study, region and country level to that
//! level's own score distribution. There is no override at these levels.

use crate::audit::ThresholdSet;
use crate::classify::category::RiskCategory;
use crate::classify::threshold::percentile_threshold;
use crate::config::AggregateClassifierConfig;

/// Result of classifying one aggregation level
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateClassification {
    pub categories: Vec<RiskCategory>,
    pub thresholds: ThresholdSet,
    /// Members with a positive score; 0 means both thresholds are fallbacks
    pub population: usize,
}

/// Classify aggregate scores against thresholds derived from their positive members
#[must_use]
pub fn classify_aggregates(
    scores: &[f64],
    config: &AggregateClassifierConfig,
    empty_multiplier: f64,
) -> AggregateClassification {
    let positive = |i: usize| scores[i] > 0.0;
    let high = percentile_threshold(
        scores,
        positive,
        config.high_percentile,
        config.min_high,
        empty_multiplier,
    );
    let medium = percentile_threshold(
        scores,
        positive,
        config.medium_percentile,
        config.min_medium,
        empty_multiplier,
    );
    let thresholds = ThresholdSet {
        high: high.value,
        medium: medium.value,
    };

    let categories = scores
        .iter()
        .map(|&score| {
            if score >= thresholds.high {
                RiskCategory::High
            } else if score >= thresholds.medium {
                RiskCategory::Medium
            } else {
                RiskCategory::Low
            }
        })
        .collect();

    AggregateClassification {
        categories,
        thresholds,
        population: high.population,
    }
}
