//! Reading a level's source table into partials

use arrow::record_batch::RecordBatch;

use crate::aggregate::level::{AggregationLevel, LevelSource};
use crate::aggregate::rollup::{GroupKey, LevelInput, Partial};
use crate::audit::{IssueKind, IssueLog};
use crate::classify::RiskCategory;
use crate::config::EngineConfig;
use crate::error::{DqiError, Result};
use crate::schema::{
    AVG_DQI_SCORE, DQI_SCORE, HIGH_RISK_COUNT, MAX_DQI_SCORE, MEDIUM_RISK_COUNT, RISK_CATEGORY,
    STD_DQI_SCORE, SUBJECT_COUNT,
};
use crate::scoring::features::clip_values;
use crate::scoring::weights::WeightRegistry;
use crate::utils::arrow::{extract_float64, extract_string};

/// Outcome of reading a source table
#[derive(Debug, Clone)]
pub enum SourceRead {
    Ready(LevelInput),
    /// The level cannot be computed; lists the absent key columns
    MissingKeys(Vec<&'static str>),
}

/// Read the rows a level is rolled up from
///
/// Missing key columns are not an error; the caller skips the level.
/// Missing score or count columns are, since the engine produces them itself.
pub fn read_source(
    level: AggregationLevel,
    batch: &RecordBatch,
    registry: &WeightRegistry,
    config: &EngineConfig,
    issues: &mut IssueLog,
) -> Result<SourceRead> {
    let mut key_columns = Vec::with_capacity(level.key_columns().len());
    let mut missing = Vec::new();
    for name in level.key_columns().iter().copied() {
        match read_identifier(level, batch, name, issues) {
            Some(values) => key_columns.push(values),
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Ok(SourceRead::MissingKeys(missing));
    }

    let num_rows = batch.num_rows();
    let keys: Vec<GroupKey> = (0..num_rows)
        .map(|row| key_columns.iter().map(|c| c[row].clone()).collect())
        .collect();

    let mut carried = Vec::new();
    for name in level.carried_columns().iter().copied() {
        if let Some(values) = read_identifier(level, batch, name, issues) {
            carried.push((name, values));
        }
    }

    let from_subjects = level.source() == LevelSource::Subjects;
    let mut features = Vec::new();
    let mut feature_values = Vec::new();
    for name in registry.feature_names() {
        // Unreadable feature columns were already reported during scoring
        if let Ok(Some(column)) = extract_float64(batch, name) {
            let mut values = column.values;
            if from_subjects {
                // Corrections were recorded when the table was scored
                clip_values(&mut values, config.value_ceilings.get(name).copied());
            }
            features.push(name.to_string());
            feature_values.push(values);
        }
    }
    let row_features =
        |row: usize| -> Vec<f64> { feature_values.iter().map(|values| values[row]).collect() };

    let partials = if from_subjects {
        let scores = required_f64(batch, DQI_SCORE)?;
        let labels = extract_string(batch, RISK_CATEGORY)?.ok_or_else(|| missing_column(RISK_CATEGORY))?;

        let mut unrecognised = 0usize;
        let partials = (0..num_rows)
            .map(|row| {
                let category = labels[row].parse::<RiskCategory>().unwrap_or_else(|_| {
                    unrecognised += 1;
                    RiskCategory::Low
                });
                Partial::subject(scores[row], category, row_features(row))
            })
            .collect();
        if unrecognised > 0 {
            issues.push(
                IssueKind::SchemaGap,
                RISK_CATEGORY,
                format!("{unrecognised} unrecognised risk categories counted as Low"),
            );
        }
        partials
    } else {
        let counts = required_f64(batch, SUBJECT_COUNT)?;
        let means = required_f64(batch, AVG_DQI_SCORE)?;
        let stds = required_f64(batch, STD_DQI_SCORE)?;
        let maxima = required_f64(batch, MAX_DQI_SCORE)?;
        let highs = required_f64(batch, HIGH_RISK_COUNT)?;
        let mediums = required_f64(batch, MEDIUM_RISK_COUNT)?;

        (0..num_rows)
            .map(|row| {
                Partial::aggregate(
                    counts[row].max(0.0) as u64,
                    means[row],
                    stds[row],
                    maxima[row],
                    row_features(row),
                    highs[row].max(0.0) as u64,
                    mediums[row].max(0.0) as u64,
                )
            })
            .collect()
    };

    Ok(SourceRead::Ready(LevelInput {
        keys,
        carried,
        features,
        partials,
    }))
}

/// Read an identifier column as text; one that cannot be read counts as absent
fn read_identifier(
    level: AggregationLevel,
    batch: &RecordBatch,
    name: &str,
    issues: &mut IssueLog,
) -> Option<Vec<String>> {
    match extract_string(batch, name) {
        Ok(values) => values,
        Err(e) => {
            issues.push(
                IssueKind::SchemaGap,
                name,
                format!("{level} level: column cannot be read as text ({e}); treated as absent"),
            );
            None
        }
    }
}

fn missing_column(name: &str) -> DqiError {
    DqiError::Schema(format!("source table has no '{name}' column"))
}

fn required_f64(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    extract_float64(batch, name)?
        .map(|column| column.values)
        .ok_or_else(|| missing_column(name))
}
