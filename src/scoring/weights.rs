//! Weight registry for DQI features
//!
//! The registry maps each raw issue feature to its weight, tier and scoring
//! rule. It is a versionable value supplied by the caller; alternate weight
//! sets can be swapped in for what-if analysis without touching the scorer.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DqiError, Result};

/// Default allowed deviation of the weight sum from 1
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 0.001;

/// Importance tier of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Patient safety signals (e.g. unreconciled serious adverse events)
    Safety,
    /// Protocol and regulatory compliance signals
    Compliance,
    /// Data management workload signals
    Operational,
}

impl Tier {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Safety => "Safety",
            Self::Compliance => "Compliance",
            Self::Operational => "Operational",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// How a feature's raw values become a component score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "rule")]
pub enum ScoringRule {
    /// Presence indicator plus magnitude against a robust reference maximum
    #[default]
    BinarySeverity,
}

/// Weight and metadata for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub name: String,
    pub weight: f64,
    pub tier: Tier,
    #[serde(default)]
    pub rule: ScoringRule,
}

impl FeatureWeight {
    pub fn new(name: impl Into<String>, weight: f64, tier: Tier) -> Self {
        Self {
            name: name.into(),
            weight,
            tier,
            rule: ScoringRule::default(),
        }
    }
}

/// Static mapping from feature name to weight, tier and rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRegistry {
    /// Label identifying this weight set in audit reports
    pub version: String,
    features: Vec<FeatureWeight>,
}

impl Default for WeightRegistry {
    /// Clinical trial data-quality weights
    fn default() -> Self {
        Self::new(
            "default-v1",
            vec![
                FeatureWeight::new("sae_pending", 0.20, Tier::Safety),
                FeatureWeight::new("missing_visits", 0.15, Tier::Compliance),
                FeatureWeight::new("missing_pages", 0.10, Tier::Compliance),
                FeatureWeight::new("open_queries", 0.10, Tier::Operational),
                FeatureWeight::new("non_conformant_data", 0.10, Tier::Compliance),
                FeatureWeight::new("sdv_incomplete", 0.10, Tier::Compliance),
                FeatureWeight::new("protocol_deviations", 0.10, Tier::Compliance),
                FeatureWeight::new("lab_issues", 0.05, Tier::Safety),
                FeatureWeight::new("coding_pending", 0.05, Tier::Operational),
                FeatureWeight::new("days_outstanding", 0.05, Tier::Operational),
            ],
        )
    }
}

impl WeightRegistry {
    /// Create a registry; call [`WeightRegistry::validate`] before scoring with it
    pub fn new(version: impl Into<String>, features: Vec<FeatureWeight>) -> Self {
        Self {
            version: version.into(),
            features,
        }
    }

    /// Build a registry from `(name, weight)` pairs, all in the operational tier
    pub fn from_pairs<'a>(
        version: impl Into<String>,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        let features = pairs
            .into_iter()
            .map(|(name, weight)| FeatureWeight::new(name, weight, Tier::Operational))
            .collect();
        Self::new(version, features)
    }

    /// Load a registry from a JSON file and validate it
    pub fn from_json_file(path: &Path, tolerance: f64) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let registry: Self = serde_json::from_str(&content)?;
        registry.validate(tolerance)?;
        Ok(registry)
    }

    /// Features in registry order
    #[must_use]
    pub fn features(&self) -> &[FeatureWeight] {
        &self.features
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureWeight> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.features.iter().map(|f| f.weight).sum()
    }

    /// Check that the registry can be used for scoring
    ///
    /// # Errors
    /// Returns [`DqiError::Configuration`] if the registry is empty, has a
    /// blank or duplicate name, a weight outside (0, 1], or weights that do
    /// not sum to 1 within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        if self.features.is_empty() {
            return Err(DqiError::configuration("weight registry is empty"));
        }

        let mut seen = HashSet::with_capacity(self.features.len());
        for feature in &self.features {
            if feature.name.trim().is_empty() {
                return Err(DqiError::configuration("feature name must not be blank"));
            }
            if !seen.insert(feature.name.as_str()) {
                return Err(DqiError::configuration(format!(
                    "feature '{}' appears more than once",
                    feature.name
                )));
            }
            if !(feature.weight.is_finite() && feature.weight > 0.0 && feature.weight <= 1.0) {
                return Err(DqiError::configuration(format!(
                    "weight for '{}' must be in (0, 1], got {}",
                    feature.name, feature.weight
                )));
            }
        }

        let total = self.total_weight();
        if (total - 1.0).abs() > tolerance {
            return Err(DqiError::configuration(format!(
                "weights must sum to 1 (±{tolerance}), got {total:.6}"
            )));
        }
        Ok(())
    }
}
