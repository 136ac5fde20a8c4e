//! Hierarchical rollup: subjects to sites, then sites to study, region and country
//!
//! Levels are computed strictly in order, each from the materialized table
//! it depends on. Every level is reclassified from its own distribution of
//! average scores; categories are never inherited from the level below.

pub mod level;
pub mod rollup;
pub mod source;

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use log::debug;

pub use level::{AggregationLevel, LevelSource};
pub use rollup::{GroupRow, GroupSummary, LevelInput, Partial};

use crate::audit::{IssueKind, IssueLog, ThresholdSet};
use crate::classify::classify_aggregates;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::scoring::weights::WeightRegistry;
use crate::utils::{log_stage_complete, log_stage_start};
use rollup::{build_level_batch, group_rows, level_schema};
use source::{SourceRead, read_source};

/// Output table of one aggregation level
#[derive(Debug, Clone)]
pub struct LevelTable {
    pub level: AggregationLevel,
    pub batch: RecordBatch,
    /// Thresholds used to classify this level; `None` when skipped
    pub thresholds: Option<ThresholdSet>,
}

impl LevelTable {
    /// An empty table for a level that could not be computed
    #[must_use]
    pub fn skipped(level: AggregationLevel) -> Self {
        let with_site_count = level.source() != LevelSource::Subjects;
        let schema = level_schema(level, &[], &[], with_site_count);
        Self {
            level,
            batch: RecordBatch::new_empty(std::sync::Arc::new(schema)),
            thresholds: None,
        }
    }

    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.thresholds.is_none()
    }
}

/// Rolls a classified subject table up the hierarchy
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    registry: &'a WeightRegistry,
    config: &'a EngineConfig,
}

impl<'a> Aggregator<'a> {
    #[must_use]
    pub const fn new(registry: &'a WeightRegistry, config: &'a EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Aggregate one level from its source table
    ///
    /// `source` must be the classified subject table for [`AggregationLevel::Site`]
    /// and the site table for every other level. A missing key column skips
    /// the level and returns an empty table.
    pub fn aggregate_level(
        &self,
        level: AggregationLevel,
        source: &RecordBatch,
        issues: &mut IssueLog,
    ) -> Result<LevelTable> {
        let start = Instant::now();
        log_stage_start(&format!("Aggregating {level} level"), source.num_rows());

        let input = match read_source(level, source, self.registry, self.config, issues)? {
            SourceRead::Ready(input) => input,
            SourceRead::MissingKeys(missing) => {
                issues.push(
                    IssueKind::SchemaGap,
                    level.name(),
                    format!("missing key columns [{}]; level skipped", missing.iter().join(", ")),
                );
                return Ok(LevelTable::skipped(level));
            }
        };

        let rows = group_rows(&input);
        let scores: Vec<f64> = rows.iter().map(|r| r.summary.avg).collect();
        let classification = classify_aggregates(
            &scores,
            &self.config.aggregate_classifier,
            self.config.empty_population_multiplier,
        );
        if classification.population == 0 && !rows.is_empty() {
            issues.push(
                IssueKind::DegenerateDistribution,
                level.name(),
                format!(
                    "no positive scores; thresholds default to high {} / medium {}",
                    classification.thresholds.high, classification.thresholds.medium
                ),
            );
        }
        debug!(
            "{level} thresholds: high {:.4}, medium {:.4}",
            classification.thresholds.high, classification.thresholds.medium
        );

        let carried: Vec<&str> = input.carried.iter().map(|(name, _)| *name).collect();
        let batch = build_level_batch(
            level,
            &carried,
            &input.features,
            level.source() != LevelSource::Subjects,
            &rows,
            &classification.categories,
        )?;
        log_stage_complete(&format!("{level} aggregation"), batch.num_rows(), Some(start.elapsed()));

        Ok(LevelTable {
            level,
            batch,
            thresholds: Some(classification.thresholds),
        })
    }

    /// Aggregate every level in order
    ///
    /// `on_level` is called before each level starts, for progress reporting.
    pub fn aggregate_all(
        &self,
        subjects: &RecordBatch,
        issues: &mut IssueLog,
        mut on_level: impl FnMut(AggregationLevel),
    ) -> Result<Vec<LevelTable>> {
        let mut tables: Vec<LevelTable> = Vec::with_capacity(AggregationLevel::ALL.len());

        for level in AggregationLevel::ALL {
            on_level(level);
            let table = match level.source() {
                LevelSource::Subjects => self.aggregate_level(level, subjects, issues)?,
                LevelSource::Level(parent) => {
                    match tables.iter().find(|t| t.level == parent && !t.is_skipped()) {
                        Some(source) => self.aggregate_level(level, &source.batch, issues)?,
                        None => {
                            issues.push(
                                IssueKind::SchemaGap,
                                level.name(),
                                format!("source level '{parent}' unavailable; level skipped"),
                            );
                            LevelTable::skipped(level)
                        }
                    }
                }
            };
            tables.push(table);
        }

        Ok(tables)
    }
}
