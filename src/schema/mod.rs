//! Column names of the subject and aggregate tables
//!
//! The subject table arrives from an ingestion collaborator with the
//! identifier columns below plus one numeric column per registry feature.

/// Study identifier
pub const STUDY: &str = "study";
/// Subject identifier
pub const SUBJECT_ID: &str = "subject_id";
/// Site identifier
pub const SITE_ID: &str = "site_id";
/// Country of the site
pub const COUNTRY: &str = "country";
/// Optional geographic region of the site
pub const REGION: &str = "region";

/// Number of registry features with a positive raw value
pub const N_ISSUE_TYPES: &str = "n_issue_types";
/// Composite score in `[0, 1]`
pub const DQI_SCORE: &str = "dqi_score";
/// Risk category (`Low`, `Medium`, `High`)
pub const RISK_CATEGORY: &str = "risk_category";

/// Number of subjects rolled into an aggregate row
pub const SUBJECT_COUNT: &str = "subject_count";
/// Number of sites rolled into an aggregate row
pub const SITE_COUNT: &str = "site_count";
pub const AVG_DQI_SCORE: &str = "avg_dqi_score";
pub const MAX_DQI_SCORE: &str = "max_dqi_score";
pub const STD_DQI_SCORE: &str = "std_dqi_score";
pub const HIGH_RISK_COUNT: &str = "high_risk_count";
pub const MEDIUM_RISK_COUNT: &str = "medium_risk_count";
pub const HIGH_RISK_RATE: &str = "high_risk_rate";

/// Name of the component column derived from a feature
#[must_use]
pub fn component_column(feature: &str) -> String {
    format!("{feature}_component")
}
