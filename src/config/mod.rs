//! Configuration for the DQI engine.
//!
//! Every tunable constant used by scoring, classification and rollup lives
//! here and is passed explicitly through each stage.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DqiError, Result};
use crate::scoring::weights::DEFAULT_WEIGHT_TOLERANCE;

/// Parameters for the per-feature reference maximum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceMaxConfig {
    /// Minimum number of positive values before the percentile is trusted
    pub min_samples: usize,
    /// Percentile of the active population used as the denominator
    pub percentile: f64,
}

impl Default for ReferenceMaxConfig {
    fn default() -> Self {
        Self {
            min_samples: 20,
            percentile: 0.95,
        }
    }
}

/// Split of a feature's weight between presence and magnitude
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// Share of the weight awarded for any occurrence at all
    pub binary_weight: f64,
    /// Share of the weight awarded for normalized magnitude
    pub severity_weight: f64,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            binary_weight: 0.5,
            severity_weight: 0.5,
        }
    }
}

/// Thresholds for subject-level risk classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectClassifierConfig {
    /// Percentile of active, non-overridden scores that marks High
    pub high_percentile: f64,
    /// Lower bound on the High threshold
    pub min_high: f64,
    /// Reported Medium threshold; any subject with an issue is at least Medium
    pub medium_threshold: f64,
}

impl Default for SubjectClassifierConfig {
    fn default() -> Self {
        Self {
            high_percentile: 0.90,
            min_high: 0.10,
            medium_threshold: 0.001,
        }
    }
}

/// Thresholds for site/study/region/country classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateClassifierConfig {
    /// Percentile of positive level scores that marks High
    pub high_percentile: f64,
    /// Lower bound on the High threshold
    pub min_high: f64,
    /// Percentile of positive level scores that marks Medium
    pub medium_percentile: f64,
    /// Lower bound on the Medium threshold
    pub min_medium: f64,
}

impl Default for AggregateClassifierConfig {
    fn default() -> Self {
        Self {
            high_percentile: 0.85,
            min_high: 0.05,
            medium_percentile: 0.50,
            min_medium: 0.02,
        }
    }
}

/// Configuration for a full engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reference maximum estimation
    pub reference_max: ReferenceMaxConfig,
    /// Binary/severity split of each component
    pub component: ComponentConfig,
    /// Subject-level classifier
    pub subject_classifier: SubjectClassifierConfig,
    /// Aggregate-level classifier, shared by every rollup level
    pub aggregate_classifier: AggregateClassifierConfig,
    /// Multiplier applied to a floor when a classification population is empty
    pub empty_population_multiplier: f64,
    /// Feature whose positive value forces a subject to High
    pub override_feature: Option<String>,
    /// Allowed deviation of the weight sum from 1
    pub weight_tolerance: f64,
    /// Upper bounds for features with a plausible maximum (e.g. elapsed days)
    pub value_ceilings: BTreeMap<String, f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut value_ceilings = BTreeMap::new();
        // Ten years of outstanding days
        value_ceilings.insert("days_outstanding".to_string(), 3650.0);

        Self {
            reference_max: ReferenceMaxConfig::default(),
            component: ComponentConfig::default(),
            subject_classifier: SubjectClassifierConfig::default(),
            aggregate_classifier: AggregateClassifierConfig::default(),
            empty_population_multiplier: 2.0,
            override_feature: Some("sae_pending".to_string()),
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            value_ceilings,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style override of the safety feature
    #[must_use]
    pub fn with_override_feature(mut self, feature: Option<&str>) -> Self {
        self.override_feature = feature.map(str::to_string);
        self
    }

    /// Check every parameter for a usable range
    ///
    /// # Errors
    /// Returns [`DqiError::Configuration`] on the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        check_fraction("reference_max.percentile", self.reference_max.percentile)?;
        if self.reference_max.min_samples == 0 {
            return Err(DqiError::configuration(
                "reference_max.min_samples must be at least 1",
            ));
        }

        let ComponentConfig {
            binary_weight,
            severity_weight,
        } = self.component;
        if binary_weight < 0.0 || severity_weight < 0.0 {
            return Err(DqiError::configuration(
                "component weights must be non-negative",
            ));
        }
        if (binary_weight + severity_weight - 1.0).abs() > 1e-9 {
            return Err(DqiError::configuration(format!(
                "binary_weight + severity_weight must equal 1, got {}",
                binary_weight + severity_weight
            )));
        }

        check_fraction(
            "subject_classifier.high_percentile",
            self.subject_classifier.high_percentile,
        )?;
        check_floor("subject_classifier.min_high", self.subject_classifier.min_high)?;
        check_floor(
            "subject_classifier.medium_threshold",
            self.subject_classifier.medium_threshold,
        )?;

        let agg = &self.aggregate_classifier;
        check_fraction("aggregate_classifier.high_percentile", agg.high_percentile)?;
        check_fraction("aggregate_classifier.medium_percentile", agg.medium_percentile)?;
        check_floor("aggregate_classifier.min_high", agg.min_high)?;
        check_floor("aggregate_classifier.min_medium", agg.min_medium)?;

        if !(self.empty_population_multiplier.is_finite() && self.empty_population_multiplier > 0.0)
        {
            return Err(DqiError::configuration(
                "empty_population_multiplier must be a positive number",
            ));
        }
        if !(self.weight_tolerance.is_finite() && self.weight_tolerance >= 0.0) {
            return Err(DqiError::configuration(
                "weight_tolerance must be a non-negative number",
            ));
        }
        for (feature, ceiling) in &self.value_ceilings {
            if !(ceiling.is_finite() && *ceiling > 0.0) {
                return Err(DqiError::configuration(format!(
                    "value ceiling for '{feature}' must be a positive number"
                )));
            }
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(DqiError::configuration(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

fn check_floor(name: &str, value: f64) -> Result<()> {
    // A zero floor turns the empty-population fallback into a zero threshold
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DqiError::configuration(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DQI Engine Configuration:")?;
        writeln!(
            f,
            "  Reference Max: p{} of active values (min {} samples)",
            self.reference_max.percentile * 100.0,
            self.reference_max.min_samples
        )?;
        writeln!(
            f,
            "  Component Split: binary {} / severity {}",
            self.component.binary_weight, self.component.severity_weight
        )?;
        writeln!(
            f,
            "  Subject Classifier: p{} (min high {}, medium {})",
            self.subject_classifier.high_percentile * 100.0,
            self.subject_classifier.min_high,
            self.subject_classifier.medium_threshold
        )?;
        writeln!(
            f,
            "  Aggregate Classifier: high p{} (min {}), medium p{} (min {})",
            self.aggregate_classifier.high_percentile * 100.0,
            self.aggregate_classifier.min_high,
            self.aggregate_classifier.medium_percentile * 100.0,
            self.aggregate_classifier.min_medium
        )?;
        writeln!(
            f,
            "  Empty Population Multiplier: {}",
            self.empty_population_multiplier
        )?;
        if let Some(feature) = &self.override_feature {
            writeln!(f, "  Safety Override Feature: {feature}")?;
        }
        for (feature, ceiling) in &self.value_ceilings {
            writeln!(f, "  Ceiling: {feature} <= {ceiling}")?;
        }
        Ok(())
    }
}
