//! Risk classification
//!
//! One percentile-with-floor method, parameterized for subjects (with the
//! safety override) and for every aggregation level (without it).

pub mod aggregate;
pub mod category;
pub mod subject;
pub mod threshold;

pub use aggregate::{AggregateClassification, classify_aggregates};
pub use category::RiskCategory;
pub use subject::{ClassifiedTable, SubjectClassification, classify_subject_table, classify_subjects};
pub use threshold::{DerivedThreshold, percentile_threshold};
