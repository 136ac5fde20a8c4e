//! Serializable audit report for one run

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{Issue, ThresholdReport};
use crate::config::EngineConfig;
use crate::engine::{DqiEngine, DqiResult};
use crate::scoring::ComponentStats;

/// Methodology and audit record written next to the output tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub weights_version: String,
    pub config: EngineConfig,
    pub subject_count: usize,
    /// Rows per aggregation level
    pub level_rows: BTreeMap<String, usize>,
    pub thresholds: ThresholdReport,
    pub override_count: usize,
    pub override_promoted: usize,
    pub component_stats: Vec<ComponentStats>,
    pub issues: Vec<Issue>,
}

impl RunReport {
    #[must_use]
    pub fn new(engine: &DqiEngine, result: &DqiResult) -> Self {
        Self {
            generated_at: Utc::now(),
            weights_version: engine.registry().version.clone(),
            config: engine.config().clone(),
            subject_count: result.subjects.num_rows(),
            level_rows: result.level_row_counts(),
            thresholds: result.thresholds.clone(),
            override_count: result.override_count,
            override_promoted: result.override_promoted,
            component_stats: result.component_stats.clone(),
            issues: result.issues.issues().to_vec(),
        }
    }
}
