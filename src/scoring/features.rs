//! Raw feature extraction and sanitization
//!
//! Reads every registry feature from the subject table as `f64`, clipping
//! values the scorer must never see (negative, non-finite, or beyond a
//! configured ceiling) and recording each correction as an issue.

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::audit::{IssueKind, IssueLog};
use crate::config::EngineConfig;
use crate::scoring::weights::WeightRegistry;
use crate::utils::arrow::extract_float64;

/// One registry feature as read from the subject table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    /// `None` when the column is absent from the input table
    pub values: Option<Vec<f64>>,
}

/// Sanitized raw feature values for every registry feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    num_rows: usize,
    columns: Vec<FeatureColumn>,
    index: FxHashMap<String, usize>,
}

impl FeatureMatrix {
    /// Build a matrix directly from columns in registry order
    #[must_use]
    pub fn new(num_rows: usize, columns: Vec<FeatureColumn>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.name.clone(), idx))
            .collect();
        Self {
            num_rows,
            columns,
            index,
        }
    }

    /// Read the registry features from a subject table
    ///
    /// Absent or non-numeric columns contribute zero and are recorded as
    /// schema gaps; this never fails.
    pub fn from_batch(
        batch: &RecordBatch,
        registry: &WeightRegistry,
        config: &EngineConfig,
        issues: &mut IssueLog,
    ) -> Self {
        let columns = registry
            .feature_names()
            .map(|name| {
                let values = match extract_float64(batch, name) {
                    Ok(Some(column)) => {
                        if column.null_count > 0 {
                            issues.push(
                                IssueKind::NumericAnomaly,
                                name,
                                format!("{} null values treated as 0", column.null_count),
                            );
                        }
                        let ceiling = config.value_ceilings.get(name).copied();
                        Some(sanitize_values(name, column.values, ceiling, issues))
                    }
                    Ok(None) => {
                        issues.push(
                            IssueKind::SchemaGap,
                            name,
                            "feature column absent; contributes zero",
                        );
                        None
                    }
                    Err(e) => {
                        issues.push(
                            IssueKind::SchemaGap,
                            name,
                            format!("feature column is not numeric ({e}); contributes zero"),
                        );
                        None
                    }
                };
                FeatureColumn {
                    name: name.to_string(),
                    values,
                }
            })
            .collect();

        Self::new(batch.num_rows(), columns)
    }

    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Values of a present feature
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.index
            .get(name)
            .and_then(|idx| self.columns[*idx].values.as_deref())
    }
}

/// Number of values each clipping rule corrected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipCounts {
    pub non_finite: usize,
    pub negative: usize,
    pub above_ceiling: usize,
}

/// Clip values into `[0, ceiling]` in place, replacing non-finite values with 0
pub fn clip_values(values: &mut [f64], ceiling: Option<f64>) -> ClipCounts {
    let mut counts = ClipCounts::default();
    for value in values {
        if !value.is_finite() {
            counts.non_finite += 1;
            *value = 0.0;
        } else if *value < 0.0 {
            counts.negative += 1;
            *value = 0.0;
        } else if let Some(limit) = ceiling {
            if *value > limit {
                counts.above_ceiling += 1;
                *value = limit;
            }
        }
    }
    counts
}

/// Clip values like [`clip_values`] and record every correction as an issue
pub fn sanitize_values(
    name: &str,
    mut values: Vec<f64>,
    ceiling: Option<f64>,
    issues: &mut IssueLog,
) -> Vec<f64> {
    let counts = clip_values(&mut values, ceiling);

    if counts.non_finite > 0 {
        issues.push(
            IssueKind::NumericAnomaly,
            name,
            format!("{} non-finite values replaced by 0", counts.non_finite),
        );
    }
    if counts.negative > 0 {
        issues.push(
            IssueKind::NumericAnomaly,
            name,
            format!("{} negative values clipped to 0", counts.negative),
        );
    }
    if let (true, Some(limit)) = (counts.above_ceiling > 0, ceiling) {
        issues.push(
            IssueKind::NumericAnomaly,
            name,
            format!("{} values above plausible ceiling clipped to {limit}", counts.above_ceiling),
        );
    }

    values
}
