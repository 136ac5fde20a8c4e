//! End-to-end DQI run over one subject table snapshot
//!
//! Validates the registry and configuration before touching any data, then
//! scores, classifies and rolls up. A run either returns a complete result
//! with its issues, or fails before scoring begins.

use std::collections::BTreeMap;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use log::info;

use crate::aggregate::{AggregationLevel, Aggregator, LevelTable};
use crate::audit::{IssueLog, ThresholdReport};
use crate::classify::classify_subject_table;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::scoring::{ComponentStats, CompositeScorer, WeightRegistry};

/// Threshold report key for the subject level
pub const SUBJECT_LEVEL: &str = "subject";

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct DqiResult {
    /// Subject table with component columns, `n_issue_types`, `dqi_score`
    /// and `risk_category`
    pub subjects: RecordBatch,
    /// One table per aggregation level, in computation order; skipped
    /// levels are present and empty
    pub levels: Vec<LevelTable>,
    pub thresholds: ThresholdReport,
    pub component_stats: Vec<ComponentStats>,
    /// Subjects with the safety override feature set
    pub override_count: usize,
    /// Overridden subjects that would not have been High on score alone
    pub override_promoted: usize,
    pub issues: IssueLog,
}

impl DqiResult {
    /// Output table of a level
    #[must_use]
    pub fn level(&self, level: AggregationLevel) -> Option<&RecordBatch> {
        self.levels
            .iter()
            .find(|t| t.level == level)
            .map(|t| &t.batch)
    }

    /// Number of rows per level, keyed by level name
    #[must_use]
    pub fn level_row_counts(&self) -> BTreeMap<String, usize> {
        self.levels
            .iter()
            .map(|t| (t.level.name().to_string(), t.batch.num_rows()))
            .collect()
    }
}

/// A validated registry and configuration, ready to score subject tables
#[derive(Debug, Clone)]
pub struct DqiEngine {
    registry: WeightRegistry,
    config: EngineConfig,
}

impl DqiEngine {
    /// Create an engine
    ///
    /// # Errors
    /// Returns [`crate::DqiError::Configuration`] if the registry or the
    /// configuration is invalid.
    pub fn new(registry: WeightRegistry, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        registry.validate(config.weight_tolerance)?;
        Ok(Self { registry, config })
    }

    #[must_use]
    pub const fn registry(&self) -> &WeightRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline on a subject table
    pub fn run(&self, subjects: &RecordBatch) -> Result<DqiResult> {
        self.run_with_progress(subjects, |_| {})
    }

    /// Run the full pipeline, calling `on_level` as each aggregation level starts
    pub fn run_with_progress(
        &self,
        subjects: &RecordBatch,
        on_level: impl FnMut(AggregationLevel),
    ) -> Result<DqiResult> {
        let start = Instant::now();
        info!(
            "Starting DQI run over {} subjects with weights '{}'",
            subjects.num_rows(),
            self.registry.version
        );
        let mut issues = IssueLog::new();

        let scored = CompositeScorer::new(&self.registry, &self.config)
            .score_table(subjects, &mut issues)?;
        let classified = classify_subject_table(&scored.batch, &self.config, &mut issues)?;

        let mut thresholds = ThresholdReport::new();
        thresholds.insert(
            SUBJECT_LEVEL.to_string(),
            classified.classification.thresholds,
        );

        let levels = Aggregator::new(&self.registry, &self.config).aggregate_all(
            &classified.batch,
            &mut issues,
            on_level,
        )?;
        for table in &levels {
            if let Some(set) = table.thresholds {
                thresholds.insert(table.level.name().to_string(), set);
            }
        }

        info!(
            "DQI run finished in {:?} with {} issues",
            start.elapsed(),
            issues.len()
        );

        Ok(DqiResult {
            subjects: classified.batch,
            levels,
            thresholds,
            component_stats: scored.stats,
            override_count: classified.classification.override_count,
            override_promoted: classified.classification.override_promoted,
            issues,
        })
    }
}
