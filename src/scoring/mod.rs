//! Subject-level DQI scoring
//!
//! Weight registry, reference maximum estimation, per-feature components and
//! the composite score.

pub mod component;
pub mod composite;
pub mod features;
pub mod reference;
pub mod weights;

pub use component::ComponentScores;
pub use composite::{ComponentStats, CompositeScorer, CompositeScores, ScoredTable};
pub use features::{FeatureColumn, FeatureMatrix};
pub use reference::{ReferenceMax, ReferenceMethod, reference_max};
pub use weights::{FeatureWeight, ScoringRule, Tier, WeightRegistry};
