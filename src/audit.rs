//! Audit records produced alongside every engine run.
//!
//! Recoverable conditions are never raised; they are collected here so the
//! caller can decide whether they warrant halting downstream consumers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::logging::log_warning;

/// Category of a recoverable condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// An expected column is absent; the feature or level degrades to zero/skip
    SchemaGap,
    /// A population has no positive values; a fallback constant was used
    DegenerateDistribution,
    /// Negative, missing or implausible values were clipped to a safe bound
    NumericAnomaly,
}

impl IssueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SchemaGap => "SchemaGap",
            Self::DegenerateDistribution => "DegenerateDistribution",
            Self::NumericAnomaly => "NumericAnomaly",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recoverable condition encountered during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Column, feature or level the issue concerns
    pub scope: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.scope, self.message)
    }
}

/// Ordered list of issues collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLog {
    issues: Vec<Issue>,
}

impl IssueLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue and emit it as a warning
    pub fn push(&mut self, kind: IssueKind, scope: impl Into<String>, message: impl Into<String>) {
        let issue = Issue {
            kind,
            scope: scope.into(),
            message: message.into(),
        };
        log_warning(&issue.to_string());
        self.issues.push(issue);
    }

    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Number of issues of the given kind
    #[must_use]
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Issues concerning a given column, feature or level
    pub fn for_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |i| i.scope == scope)
    }
}

/// Score cutoffs derived from one population at classification time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub high: f64,
    pub medium: f64,
}

/// Thresholds used at every classified level, keyed by level name
pub type ThresholdReport = BTreeMap<String, ThresholdSet>;
