//! Per-feature component scoring
//!
//! A component combines whether an issue is present at all with how severe
//! it is relative to the feature's reference maximum. The rule is chosen per
//! feature through [`ScoringRule`].

use crate::config::EngineConfig;
use crate::scoring::reference::{ReferenceMax, reference_max};
use crate::scoring::weights::ScoringRule;

/// Component scores for one feature across the population
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScores {
    pub scores: Vec<f64>,
    /// `None` when the feature carried no signal and no denominator was needed
    pub reference: Option<ReferenceMax>,
}

impl ComponentScores {
    fn zeros(len: usize) -> Self {
        Self {
            scores: vec![0.0; len],
            reference: None,
        }
    }
}

impl ScoringRule {
    /// Score every entity for one feature of the given weight
    #[must_use]
    pub fn component_scores(self, values: &[f64], weight: f64, config: &EngineConfig) -> ComponentScores {
        match self {
            Self::BinarySeverity => binary_severity(values, weight, config),
        }
    }
}

/// `weight * (binary_weight * [v > 0] + severity_weight * clip(v / ref, 0, 1))`
///
/// An all-zero feature scores 0 everywhere without estimating a reference.
fn binary_severity(values: &[f64], weight: f64, config: &EngineConfig) -> ComponentScores {
    if !values.iter().any(|v| *v > 0.0) {
        return ComponentScores::zeros(values.len());
    }

    let reference = reference_max(values, &config.reference_max);
    let binary_weight = config.component.binary_weight;
    let severity_weight = config.component.severity_weight;

    let scores = values
        .iter()
        .map(|&value| {
            let binary = if value > 0.0 { 1.0 } else { 0.0 };
            let severity = (value / reference.value).clamp(0.0, 1.0);
            weight * (binary_weight * binary + severity_weight * severity)
        })
        .collect();

    ComponentScores {
        scores,
        reference: Some(reference),
    }
}
