use dqi_engine::config::ReferenceMaxConfig;
use dqi_engine::schema::{DQI_SCORE, N_ISSUE_TYPES, RISK_CATEGORY, component_column};
use dqi_engine::scoring::{ReferenceMethod, reference_max};
use dqi_engine::{DqiEngine, EngineConfig, IssueKind, WeightRegistry};

use crate::utils::{SubjectIds, f64_values, print_batch_summary, string_values, subject_batch};

const THREE_SUBJECTS: [SubjectIds<'static>; 3] = [
    ("ST-1", "A", "S-01", "DK", "EU"),
    ("ST-1", "B", "S-01", "DK", "EU"),
    ("ST-1", "C", "S-01", "DK", "EU"),
];

fn two_feature_engine() -> DqiEngine {
    let registry = WeightRegistry::from_pairs("scenario", [("sae", 0.5), ("missing_visit", 0.5)]);
    let config = EngineConfig::default().with_override_feature(Some("sae"));
    DqiEngine::new(registry, config).unwrap()
}

/// A pending safety event forces High; a clean subject scores zero and stays Low
#[test]
fn test_safety_override_scenario() {
    let batch = subject_batch(
        &THREE_SUBJECTS,
        &[
            ("sae", vec![1.0, 0.0, 0.0]),
            ("missing_visit", vec![0.0, 5.0, 0.0]),
        ],
        true,
    );
    let result = two_feature_engine().run(&batch).unwrap();
    print_batch_summary("subjects", &result.subjects);

    let scores = f64_values(&result.subjects, DQI_SCORE);
    let categories = string_values(&result.subjects, RISK_CATEGORY);

    assert_eq!(categories[0], "High");
    assert_eq!(scores[2], 0.0);
    assert_eq!(categories[2], "Low");
    assert_eq!(result.override_count, 1);

    // Single active value: reference max is that value, so both components saturate
    assert!((scores[0] - 0.5).abs() < 1e-12);
    assert!((scores[1] - 0.5).abs() < 1e-12);
    assert_eq!(f64_values(&result.subjects, &component_column("sae")), vec![0.5, 0.0, 0.0]);
    assert_eq!(f64_values(&result.subjects, N_ISSUE_TYPES), vec![1.0, 1.0, 0.0]);
}

#[test]
fn test_reference_max_scenario() {
    let values = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0];

    let sparse = reference_max(&values, &ReferenceMaxConfig::default());
    assert_eq!(sparse.value, 5.0);
    assert_eq!(sparse.method, ReferenceMethod::SparseMaximum);

    let config = ReferenceMaxConfig {
        min_samples: 2,
        percentile: 0.95,
    };
    let dense = reference_max(&values, &config);
    assert!((dense.value - 4.8).abs() < 1e-12);
    assert_eq!(dense.method, ReferenceMethod::Percentile);
    assert_eq!(dense.active_count, 5);
}

/// Astronomical, negative and non-finite raw values never push a score out of [0, 1]
#[test]
fn test_scores_bounded_for_extreme_values() {
    let ids: Vec<SubjectIds<'_>> = (0..5)
        .map(|_| ("ST-1", "X", "S-01", "DK", "EU"))
        .collect();
    let batch = subject_batch(
        &ids,
        &[
            ("open_queries", vec![1e9, 0.0, 3.0, -4.0, 1.0]),
            ("days_outstanding", vec![1e12, 5.0, f64::NAN, 0.0, f64::INFINITY]),
        ],
        true,
    );
    let registry =
        WeightRegistry::from_pairs("extreme", [("open_queries", 0.6), ("days_outstanding", 0.4)]);
    let engine = DqiEngine::new(registry, EngineConfig::default().with_override_feature(None))
        .unwrap();
    let result = engine.run(&batch).unwrap();

    for score in f64_values(&result.subjects, DQI_SCORE) {
        assert!((0.0..=1.0).contains(&score), "score {score} out of bounds");
    }
    for component in f64_values(&result.subjects, &component_column("open_queries")) {
        assert!((0.0..=0.6).contains(&component));
    }
    assert!(result.issues.count(IssueKind::NumericAnomaly) >= 2);
}

#[test]
fn test_absent_feature_contributes_zero() {
    let batch = subject_batch(&THREE_SUBJECTS, &[("sae", vec![0.0, 2.0, 0.0])], true);
    let result = two_feature_engine().run(&batch).unwrap();

    let gaps: Vec<_> = result.issues.for_scope("missing_visit").collect();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].kind, IssueKind::SchemaGap);
    assert_eq!(
        f64_values(&result.subjects, &component_column("missing_visit")),
        vec![0.0, 0.0, 0.0]
    );
}

#[test]
fn test_all_zero_feature_scores_zero() {
    let batch = subject_batch(
        &THREE_SUBJECTS,
        &[("sae", vec![0.0; 3]), ("missing_visit", vec![0.0; 3])],
        true,
    );
    let result = two_feature_engine().run(&batch).unwrap();

    assert_eq!(f64_values(&result.subjects, DQI_SCORE), vec![0.0; 3]);
    assert!(
        string_values(&result.subjects, RISK_CATEGORY)
            .iter()
            .all(|c| c == "Low")
    );
}

#[test]
fn test_unbalanced_weights_rejected() {
    let registry = WeightRegistry::from_pairs("bad", [("sae", 0.5), ("missing_visit", 0.4)]);
    let err = DqiEngine::new(registry, EngineConfig::default()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_empty_table_runs() {
    let batch = subject_batch(&[], &[("sae", vec![]), ("missing_visit", vec![])], true);
    let result = two_feature_engine().run(&batch).unwrap();
    assert_eq!(result.subjects.num_rows(), 0);
    assert!(result.levels.iter().all(|l| l.batch.num_rows() == 0));
}

/// The override feature need not be weighted; a zero score is still promoted
#[test]
fn test_override_promotes_zero_score() {
    let batch = subject_batch(
        &THREE_SUBJECTS,
        &[
            ("sae", vec![1.0, 0.0, 0.0]),
            ("missing_visit", vec![0.0, 0.0, 2.0]),
        ],
        true,
    );
    let registry = WeightRegistry::from_pairs("visits", [("missing_visit", 1.0)]);
    let engine =
        DqiEngine::new(registry, EngineConfig::default().with_override_feature(Some("sae")))
            .unwrap();
    let result = engine.run(&batch).unwrap();

    assert_eq!(f64_values(&result.subjects, DQI_SCORE)[0], 0.0);
    assert_eq!(string_values(&result.subjects, RISK_CATEGORY)[0], "High");
    assert_eq!(result.override_count, 1);
    assert_eq!(result.override_promoted, 1);
}

#[test]
fn test_all_zero_feature_recorded_as_degenerate() {
    let batch = subject_batch(
        &THREE_SUBJECTS,
        &[
            ("sae", vec![0.0, 0.0, 0.0]),
            ("missing_visit", vec![0.0, 2.0, 0.0]),
        ],
        true,
    );
    let result = two_feature_engine().run(&batch).unwrap();

    let sae: Vec<_> = result.issues.for_scope("sae").collect();
    assert_eq!(sae.len(), 1);
    assert_eq!(sae[0].kind, IssueKind::DegenerateDistribution);
    assert!(
        !result
            .issues
            .for_scope("missing_visit")
            .any(|i| i.kind == IssueKind::DegenerateDistribution)
    );
}
