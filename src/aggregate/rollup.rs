//! Group-by reduction for one aggregation level
//!
//! Each source row is summarized as a [`Partial`] (a single subject, or a
//! lower-level aggregate carrying its own count, mean and spread). Partials
//! in a group are sorted before they are combined, so the result does not
//! depend on the order of the input rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::aggregate::level::AggregationLevel;
use crate::classify::RiskCategory;
use crate::error::Result;
use crate::schema::{
    AVG_DQI_SCORE, HIGH_RISK_COUNT, HIGH_RISK_RATE, MAX_DQI_SCORE, MEDIUM_RISK_COUNT,
    RISK_CATEGORY, SITE_COUNT, STD_DQI_SCORE, SUBJECT_COUNT,
};
use crate::utils::arrow::UNKNOWN_IDENTIFIER;

/// Values of a level's key columns for one row
pub type GroupKey = SmallVec<[String; 2]>;

/// Summary of one source row
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub subjects: u64,
    pub sites: u64,
    pub mean: f64,
    /// Sum of squared deviations of subject scores from `mean`
    pub m2: f64,
    pub max: f64,
    pub feature_sums: Vec<f64>,
    pub high: u64,
    pub medium: u64,
}

impl Partial {
    /// A single classified subject
    #[must_use]
    pub fn subject(score: f64, category: RiskCategory, features: Vec<f64>) -> Self {
        Self {
            subjects: 1,
            sites: 0,
            mean: score,
            m2: 0.0,
            max: score,
            feature_sums: features,
            high: u64::from(category == RiskCategory::High),
            medium: u64::from(category == RiskCategory::Medium),
        }
    }

    /// A lower-level aggregate row with sample standard deviation `std`
    #[must_use]
    pub fn aggregate(
        subjects: u64,
        mean: f64,
        std: f64,
        max: f64,
        feature_sums: Vec<f64>,
        high: u64,
        medium: u64,
    ) -> Self {
        let m2 = if subjects > 1 {
            std * std * (subjects - 1) as f64
        } else {
            0.0
        };
        Self {
            subjects,
            sites: 1,
            mean,
            m2,
            max,
            feature_sums,
            high,
            medium,
        }
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.mean
            .total_cmp(&other.mean)
            .then(self.subjects.cmp(&other.subjects))
            .then(self.max.total_cmp(&other.max))
            .then(self.m2.total_cmp(&other.m2))
            .then(self.high.cmp(&other.high))
            .then(self.medium.cmp(&other.medium))
            .then(self.sites.cmp(&other.sites))
            .then_with(|| {
                self.feature_sums
                    .iter()
                    .zip(&other.feature_sums)
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// Combined statistics of one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub subject_count: u64,
    pub site_count: u64,
    pub avg: f64,
    pub max: f64,
    /// Sample standard deviation of subject scores; 0 for a single subject
    pub std: f64,
    pub feature_sums: Vec<f64>,
    pub high: u64,
    pub medium: u64,
    /// `high / subject_count`, 0 for an empty group
    pub high_risk_rate: f64,
}

/// Combine the partials of one group into exact subject-level statistics
#[must_use]
pub fn combine(mut partials: Vec<Partial>, n_features: usize) -> GroupSummary {
    partials.sort_by(Partial::total_cmp);

    let subject_count: u64 = partials.iter().map(|p| p.subjects).sum();
    let site_count: u64 = partials.iter().map(|p| p.sites).sum();
    let high: u64 = partials.iter().map(|p| p.high).sum();
    let medium: u64 = partials.iter().map(|p| p.medium).sum();
    let feature_sums = (0..n_features)
        .map(|f| partials.iter().map(|p| p.feature_sums[f]).sum::<f64>())
        .collect();

    if subject_count == 0 {
        return GroupSummary {
            subject_count,
            site_count,
            avg: 0.0,
            max: 0.0,
            std: 0.0,
            feature_sums,
            high,
            medium,
            high_risk_rate: 0.0,
        };
    }

    let n = subject_count as f64;
    let avg = partials
        .iter()
        .map(|p| p.subjects as f64 * p.mean)
        .sum::<f64>()
        / n;
    let squared_deviations: f64 = partials
        .iter()
        .map(|p| {
            let delta = p.mean - avg;
            p.m2 + p.subjects as f64 * delta * delta
        })
        .sum();
    let std = if subject_count > 1 {
        (squared_deviations / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let max = partials
        .iter()
        .map(|p| p.max)
        .max_by(f64::total_cmp)
        .unwrap_or(0.0);

    GroupSummary {
        subject_count,
        site_count,
        avg,
        max,
        std: if std.is_finite() { std } else { 0.0 },
        feature_sums,
        high,
        medium,
        high_risk_rate: (high as f64 / n).clamp(0.0, 1.0),
    }
}

/// One output row before classification
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: GroupKey,
    /// Most frequent value of each carried column
    pub carried: Vec<String>,
    pub summary: GroupSummary,
}

/// Rows of a level's source table, ready for grouping
#[derive(Debug, Clone, Default)]
pub struct LevelInput {
    pub keys: Vec<GroupKey>,
    /// `(column, values)` for each carried column present in the source
    pub carried: Vec<(&'static str, Vec<String>)>,
    pub features: Vec<String>,
    pub partials: Vec<Partial>,
}

/// Group rows by key and reduce each group; rows are sorted by key
#[must_use]
pub fn group_rows(input: &LevelInput) -> Vec<GroupRow> {
    let mut groups: BTreeMap<&GroupKey, Vec<usize>> = BTreeMap::new();
    for (row, key) in input.keys.iter().enumerate() {
        groups.entry(key).or_default().push(row);
    }
    let groups: Vec<(&GroupKey, Vec<usize>)> = groups.into_iter().collect();
    let n_features = input.features.len();

    groups
        .into_par_iter()
        .map(|(key, rows)| {
            let carried = input
                .carried
                .iter()
                .map(|(_, values)| most_frequent(rows.iter().map(|r| values[*r].as_str())))
                .collect();
            let partials = rows.iter().map(|r| input.partials[*r].clone()).collect();
            GroupRow {
                key: key.clone(),
                carried,
                summary: combine(partials, n_features),
            }
        })
        .collect()
}

/// Most frequent value; ties go to the lexicographically smallest
fn most_frequent<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map_or_else(|| UNKNOWN_IDENTIFIER.to_string(), |(value, _)| value.to_string())
}

/// Schema of a level's output table
#[must_use]
pub fn level_schema(
    level: AggregationLevel,
    carried: &[&str],
    features: &[String],
    with_site_count: bool,
) -> Schema {
    let mut fields: Vec<Field> = Vec::new();
    for name in level.key_columns().iter().copied() {
        fields.push(Field::new(name, DataType::Utf8, false));
    }
    for name in carried.iter().copied() {
        fields.push(Field::new(name, DataType::Utf8, false));
    }

    fields.push(Field::new(SUBJECT_COUNT, DataType::UInt64, false));
    if with_site_count {
        fields.push(Field::new(SITE_COUNT, DataType::UInt64, false));
    }
    fields.push(Field::new(AVG_DQI_SCORE, DataType::Float64, false));
    fields.push(Field::new(MAX_DQI_SCORE, DataType::Float64, false));
    fields.push(Field::new(STD_DQI_SCORE, DataType::Float64, false));
    fields.extend(
        features
            .iter()
            .map(|f| Field::new(f.as_str(), DataType::Float64, false)),
    );
    fields.push(Field::new(HIGH_RISK_COUNT, DataType::UInt64, false));
    fields.push(Field::new(MEDIUM_RISK_COUNT, DataType::UInt64, false));
    fields.push(Field::new(HIGH_RISK_RATE, DataType::Float64, false));
    fields.push(Field::new(RISK_CATEGORY, DataType::Utf8, false));

    Schema::new(fields)
}

/// Assemble the output table of a level
pub fn build_level_batch(
    level: AggregationLevel,
    carried: &[&str],
    features: &[String],
    with_site_count: bool,
    rows: &[GroupRow],
    categories: &[RiskCategory],
) -> Result<RecordBatch> {
    let schema = Arc::new(level_schema(level, carried, features, with_site_count));

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for idx in 0..level.key_columns().len() {
        columns.push(Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.key[idx].as_str()),
        )));
    }
    for idx in 0..carried.len() {
        columns.push(Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.carried[idx].as_str()),
        )));
    }

    columns.push(u64_column(rows, |s| s.subject_count));
    if with_site_count {
        columns.push(u64_column(rows, |s| s.site_count));
    }
    columns.push(f64_column(rows, |s| s.avg));
    columns.push(f64_column(rows, |s| s.max));
    columns.push(f64_column(rows, |s| s.std));
    for idx in 0..features.len() {
        columns.push(f64_column(rows, |s| s.feature_sums[idx]));
    }
    columns.push(u64_column(rows, |s| s.high));
    columns.push(u64_column(rows, |s| s.medium));
    columns.push(f64_column(rows, |s| s.high_risk_rate));
    columns.push(Arc::new(StringArray::from_iter_values(
        categories.iter().map(|c| c.as_str()),
    )));

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn u64_column(rows: &[GroupRow], value: impl Fn(&GroupSummary) -> u64) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| value(&r.summary))))
}

fn f64_column(rows: &[GroupRow], value: impl Fn(&GroupSummary) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| value(&r.summary))))
}
