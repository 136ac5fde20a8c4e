//! Subject-level risk classification with the safety override
//!
//! Any subject with a positive value for the designated safety feature is
//! High regardless of its score. Overridden subjects are excluded from the
//! population the High threshold is derived from, so they cannot pull the
//! threshold up for everyone else.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use log::info;

use crate::audit::{IssueKind, IssueLog, ThresholdSet};
use crate::classify::category::RiskCategory;
use crate::classify::threshold::percentile_threshold;
use crate::config::{EngineConfig, SubjectClassifierConfig};
use crate::error::{DqiError, Result};
use crate::schema::{DQI_SCORE, N_ISSUE_TYPES, RISK_CATEGORY};
use crate::scoring::features::clip_values;
use crate::utils::arrow::{extract_float64, with_replaced_columns};

/// Result of classifying a subject population
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectClassification {
    pub categories: Vec<RiskCategory>,
    pub thresholds: ThresholdSet,
    /// Subjects eligible for the percentile (has issues, not overridden)
    pub population: usize,
    /// Subjects with the override feature set
    pub override_count: usize,
    /// Overridden subjects whose own score was below the High threshold
    pub override_promoted: usize,
}

/// Classify subjects from their scores
///
/// * `n_issue_types` - when absent, a positive score counts as having issues
/// * `override_values` - raw safety feature values; absent means no override
#[must_use]
pub fn classify_subjects(
    scores: &[f64],
    n_issue_types: Option<&[u32]>,
    override_values: Option<&[f64]>,
    config: &SubjectClassifierConfig,
    empty_multiplier: f64,
) -> SubjectClassification {
    let has_issues: Vec<bool> = match n_issue_types {
        Some(counts) => counts.iter().map(|n| *n > 0).collect(),
        None => scores.iter().map(|s| *s > 0.0).collect(),
    };
    let overridden: Vec<bool> = match override_values {
        Some(values) => values.iter().map(|v| *v > 0.0).collect(),
        None => vec![false; scores.len()],
    };

    let high = percentile_threshold(
        scores,
        |i| has_issues[i] && !overridden[i],
        config.high_percentile,
        config.min_high,
        empty_multiplier,
    );
    let thresholds = ThresholdSet {
        high: high.value,
        medium: config.medium_threshold,
    };

    let categories: Vec<RiskCategory> = scores
        .iter()
        .enumerate()
        .map(|(i, &score)| {
            let mut category = RiskCategory::Low;
            if has_issues[i] {
                category = RiskCategory::Medium;
            }
            if !overridden[i] && score >= thresholds.high {
                category = RiskCategory::High;
            }
            // Safety override always wins
            if overridden[i] {
                category = RiskCategory::High;
            }
            category
        })
        .collect();

    let override_count = overridden.iter().filter(|o| **o).count();
    let override_promoted = scores
        .iter()
        .zip(&overridden)
        .filter(|(score, o)| **o && **score < thresholds.high)
        .count();

    SubjectClassification {
        categories,
        thresholds,
        population: high.population,
        override_count,
        override_promoted,
    }
}

/// Subject table with `risk_category` appended
#[derive(Debug, Clone)]
pub struct ClassifiedTable {
    pub batch: RecordBatch,
    pub classification: SubjectClassification,
}

/// Classify a scored subject table and append `risk_category`
///
/// Requires a `dqi_score` column. A missing `n_issue_types` column or a
/// missing override feature column degrades to "positive score means
/// issues" and "no override" respectively.
pub fn classify_subject_table(
    batch: &RecordBatch,
    config: &EngineConfig,
    issues: &mut IssueLog,
) -> Result<ClassifiedTable> {
    let scores = extract_float64(batch, DQI_SCORE)?
        .ok_or_else(|| DqiError::Schema(format!("subject table has no '{DQI_SCORE}' column")))?
        .values;

    let n_issue_types: Option<Vec<u32>> = match extract_float64(batch, N_ISSUE_TYPES) {
        Ok(Some(column)) => Some(column.values.iter().map(|v| v.max(0.0) as u32).collect()),
        Ok(None) | Err(_) => {
            issues.push(
                IssueKind::SchemaGap,
                N_ISSUE_TYPES,
                "issue type counts unavailable; a positive score marks a subject as having issues",
            );
            None
        }
    };

    let override_values = match &config.override_feature {
        Some(feature) => match extract_float64(batch, feature) {
            Ok(Some(column)) => {
                // Same cleaning as scoring, so a value scored as 0 never overrides
                let mut values = column.values;
                clip_values(&mut values, config.value_ceilings.get(feature).copied());
                Some(values)
            }
            Ok(None) | Err(_) => {
                issues.push(
                    IssueKind::SchemaGap,
                    feature.as_str(),
                    "safety override feature unavailable; no subject is overridden",
                );
                None
            }
        },
        None => None,
    };

    let classification = classify_subjects(
        &scores,
        n_issue_types.as_deref(),
        override_values.as_deref(),
        &config.subject_classifier,
        config.empty_population_multiplier,
    );

    if classification.population == 0 && !scores.is_empty() {
        issues.push(
            IssueKind::DegenerateDistribution,
            "subject",
            format!(
                "no eligible subject scores; high threshold defaults to {}",
                classification.thresholds.high
            ),
        );
    }
    info!(
        "Subject thresholds: high {:.4}, medium {:.4}; {} overridden ({} promoted by override alone)",
        classification.thresholds.high,
        classification.thresholds.medium,
        classification.override_count,
        classification.override_promoted
    );

    let categories: ArrayRef = Arc::new(StringArray::from_iter_values(
        classification.categories.iter().map(|c| c.as_str()),
    ));
    let batch = with_replaced_columns(
        batch,
        vec![(Field::new(RISK_CATEGORY, DataType::Utf8, false), categories)],
    )?;

    Ok(ClassifiedTable {
        batch,
        classification,
    })
}
