//! Composite DQI scoring
//!
//! Sums the weighted components of every registry feature into a bounded
//! subject-level score. Scoring is a pure function of the subject table,
//! the registry and the configuration: the same inputs always produce a
//! bit-identical result.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, Float64Array, UInt32Array};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::audit::{IssueKind, IssueLog};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::schema::{DQI_SCORE, N_ISSUE_TYPES, component_column};
use crate::scoring::component::ComponentScores;
use crate::scoring::features::FeatureMatrix;
use crate::scoring::reference::{ReferenceMax, ReferenceMethod};
use crate::scoring::weights::{Tier, WeightRegistry};
use crate::utils::arrow::with_replaced_columns;
use crate::utils::{log_stage_complete, log_stage_start, stats};

/// Audit summary of one feature's contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub feature: String,
    pub weight: f64,
    pub tier: Tier,
    /// Whether the feature column was present in the input
    pub present: bool,
    pub reference: Option<ReferenceMax>,
    /// Subjects with a positive raw value
    pub affected_subjects: usize,
    pub mean_raw: f64,
    pub max_raw: f64,
    pub mean_component: f64,
    pub max_component: f64,
}

/// Output of composite scoring, column-wise
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScores {
    /// `(feature, component scores)` in registry order
    pub components: Vec<(String, Vec<f64>)>,
    pub n_issue_types: Vec<u32>,
    pub dqi_scores: Vec<f64>,
    pub stats: Vec<ComponentStats>,
}

/// Subject table augmented with scoring columns
#[derive(Debug, Clone)]
pub struct ScoredTable {
    pub batch: RecordBatch,
    pub stats: Vec<ComponentStats>,
}

/// Scores subjects against a weight registry
///
/// The registry is expected to have been validated; the scorer does not
/// re-check the weight sum.
#[derive(Debug, Clone, Copy)]
pub struct CompositeScorer<'a> {
    registry: &'a WeightRegistry,
    config: &'a EngineConfig,
}

impl<'a> CompositeScorer<'a> {
    #[must_use]
    pub const fn new(registry: &'a WeightRegistry, config: &'a EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Score a sanitized feature matrix
    ///
    /// Features absent from the matrix contribute zero.
    #[must_use]
    pub fn score(&self, matrix: &FeatureMatrix) -> CompositeScores {
        let num_rows = matrix.num_rows();

        // Features are independent; collect keeps registry order
        let per_feature: Vec<(ComponentScores, ComponentStats)> = self
            .registry
            .features()
            .par_iter()
            .map(|feature| {
                let raw = matrix.values(&feature.name);
                let component = match raw {
                    Some(values) => feature
                        .rule
                        .component_scores(values, feature.weight, self.config),
                    None => ComponentScores {
                        scores: vec![0.0; num_rows],
                        reference: None,
                    },
                };

                let raw_values = raw.unwrap_or(&[]);
                let stats = ComponentStats {
                    feature: feature.name.clone(),
                    weight: feature.weight,
                    tier: feature.tier,
                    present: raw.is_some(),
                    reference: component.reference,
                    affected_subjects: raw_values.iter().filter(|v| **v > 0.0).count(),
                    mean_raw: stats::mean(raw_values),
                    max_raw: stats::max(raw_values),
                    mean_component: stats::mean(&component.scores),
                    max_component: stats::max(&component.scores),
                };
                debug!(
                    "Scored feature '{}': {} affected, reference {:?}",
                    stats.feature, stats.affected_subjects, stats.reference
                );
                (component, stats)
            })
            .collect();

        let mut n_issue_types = vec![0u32; num_rows];
        for column in matrix.columns() {
            if let Some(values) = &column.values {
                for (count, value) in n_issue_types.iter_mut().zip(values) {
                    if *value > 0.0 {
                        *count += 1;
                    }
                }
            }
        }

        let dqi_scores = (0..num_rows)
            .map(|row| {
                let total: f64 = per_feature.iter().map(|(c, _)| c.scores[row]).sum();
                if total.is_nan() { 0.0 } else { total.clamp(0.0, 1.0) }
            })
            .collect();

        let (components, stats): (Vec<_>, Vec<_>) = per_feature
            .into_iter()
            .map(|(component, stats)| ((stats.feature.clone(), component.scores), stats))
            .unzip();

        CompositeScores {
            components,
            n_issue_types,
            dqi_scores,
            stats,
        }
    }

    /// Score a subject table and append the derived columns
    ///
    /// Appends one `<feature>_component` column per registry feature, then
    /// `n_issue_types` and `dqi_score`. Previously derived columns with the
    /// same names are replaced.
    pub fn score_table(&self, batch: &RecordBatch, issues: &mut IssueLog) -> Result<ScoredTable> {
        let start = Instant::now();
        log_stage_start("Scoring subjects", batch.num_rows());

        let matrix = FeatureMatrix::from_batch(batch, self.registry, self.config, issues);
        let scores = self.score(&matrix);
        record_degenerate_features(&scores.stats, issues);

        let mut columns: Vec<(Field, ArrayRef)> = scores
            .components
            .into_iter()
            .map(|(feature, values)| {
                let field = Field::new(component_column(&feature), DataType::Float64, false);
                let array: ArrayRef = Arc::new(Float64Array::from(values));
                (field, array)
            })
            .collect();
        columns.push((
            Field::new(N_ISSUE_TYPES, DataType::UInt32, false),
            Arc::new(UInt32Array::from(scores.n_issue_types)),
        ));
        columns.push((
            Field::new(DQI_SCORE, DataType::Float64, false),
            Arc::new(Float64Array::from(scores.dqi_scores)),
        ));

        let scored = with_replaced_columns(batch, columns)?;
        log_stage_complete("subject scoring", scored.num_rows(), Some(start.elapsed()));

        Ok(ScoredTable {
            batch: scored,
            stats: scores.stats,
        })
    }
}

/// Record present features whose values gave no usable scale
fn record_degenerate_features(stats: &[ComponentStats], issues: &mut IssueLog) {
    for feature in stats.iter().filter(|f| f.present) {
        match feature.reference {
            None => issues.push(
                IssueKind::DegenerateDistribution,
                feature.feature.as_str(),
                "no positive values; component is 0 for every subject",
            ),
            Some(ReferenceMax {
                method: ReferenceMethod::DegeneratePercentile,
                value,
                ..
            }) => issues.push(
                IssueKind::DegenerateDistribution,
                feature.feature.as_str(),
                format!("percentile of active values not positive; reference max falls back to {value}"),
            ),
            Some(_) => {}
        }
    }
}
