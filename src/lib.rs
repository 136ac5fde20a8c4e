//! Data Quality Index scoring for clinical trial subject tables.
//!
//! Scores each subject from weighted, normalized issue counts, classifies
//! subjects into risk categories with data-driven thresholds, and rolls the
//! results up through site, study, region and country.

pub mod aggregate;
pub mod audit;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod synthetic;
pub mod utils;

// Core types
pub use config::EngineConfig;
pub use engine::{DqiEngine, DqiResult};
pub use error::{DqiError, Result};
pub use report::RunReport;

// Scoring and classification
pub use aggregate::{AggregationLevel, LevelTable};
pub use audit::{Issue, IssueKind, IssueLog, ThresholdReport, ThresholdSet};
pub use classify::RiskCategory;
pub use scoring::{FeatureWeight, ScoringRule, Tier, WeightRegistry};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// I/O
pub use io::{read_subject_table, read_subject_table_async, write_outputs, write_report, write_table};
pub use synthetic::generate_subject_table;
