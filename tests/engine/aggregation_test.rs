use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int32Array, StructArray};
use arrow::datatypes::{DataType, Field};
use dqi_engine::aggregate::AggregationLevel;
use dqi_engine::utils::arrow::with_replaced_columns;
use dqi_engine::schema::{
    AVG_DQI_SCORE, COUNTRY, DQI_SCORE, HIGH_RISK_COUNT, HIGH_RISK_RATE, REGION, RISK_CATEGORY,
    SITE_COUNT, SITE_ID, STD_DQI_SCORE, SUBJECT_COUNT,
};
use dqi_engine::{DqiEngine, EngineConfig, IssueKind, WeightRegistry, generate_subject_table};

use crate::utils::{SubjectIds, f64_values, print_batch_summary, string_values, subject_batch};

fn default_engine() -> DqiEngine {
    DqiEngine::new(WeightRegistry::default(), EngineConfig::default()).unwrap()
}

fn small_engine() -> DqiEngine {
    let registry =
        WeightRegistry::from_pairs("small", [("open_queries", 0.7), ("missing_pages", 0.3)]);
    DqiEngine::new(registry, EngineConfig::default().with_override_feature(None)).unwrap()
}

const FOUR_SUBJECTS: [SubjectIds<'static>; 4] = [
    ("ST-1", "A", "S-01", "DK", "EU"),
    ("ST-1", "B", "S-02", "SE", "EU"),
    ("ST-1", "C", "S-02", "SE", "EU"),
    ("ST-2", "D", "S-01", "US", "NA"),
];

#[test]
fn test_singleton_site_has_zero_std() {
    let batch = subject_batch(
        &FOUR_SUBJECTS,
        &[
            ("open_queries", vec![4.0, 1.0, 0.0, 2.0]),
            ("missing_pages", vec![0.0, 3.0, 1.0, 0.0]),
        ],
        true,
    );
    let result = small_engine().run(&batch).unwrap();
    let sites = result.level(AggregationLevel::Site).unwrap();
    print_batch_summary("site", sites);

    // (ST-1, S-01), (ST-1, S-02), (ST-2, S-01): the same site id in two studies stays separate
    assert_eq!(sites.num_rows(), 3);
    let counts = f64_values(sites, SUBJECT_COUNT);
    let stds = f64_values(sites, STD_DQI_SCORE);
    for (count, std) in counts.iter().zip(&stds) {
        assert!(!std.is_nan());
        if *count == 1.0 {
            assert_eq!(*std, 0.0);
        }
    }
    assert_eq!(counts, vec![1.0, 2.0, 1.0]);
    assert_eq!(string_values(sites, COUNTRY), vec!["DK", "SE", "US"]);
}

#[test]
fn test_site_statistics_match_subjects() {
    let batch = subject_batch(
        &FOUR_SUBJECTS,
        &[
            ("open_queries", vec![4.0, 1.0, 0.0, 2.0]),
            ("missing_pages", vec![0.0, 3.0, 1.0, 0.0]),
        ],
        true,
    );
    let result = small_engine().run(&batch).unwrap();
    let scores = f64_values(&result.subjects, DQI_SCORE);
    let sites = result.level(AggregationLevel::Site).unwrap();

    // Second site holds subjects B and C
    let avg = f64_values(sites, AVG_DQI_SCORE)[1];
    assert!((avg - (scores[1] + scores[2]) / 2.0).abs() < 1e-12);
    let expected_std = (scores[1] - scores[2]).abs() / 2.0_f64.sqrt();
    assert!((f64_values(sites, STD_DQI_SCORE)[1] - expected_std).abs() < 1e-12);
    assert_eq!(f64_values(sites, "open_queries")[1], 1.0);
    assert_eq!(f64_values(sites, "missing_pages")[1], 4.0);
}

#[test]
fn test_higher_levels_preserve_subject_totals() {
    let registry = WeightRegistry::default();
    let batch = generate_subject_table(600, 3, &registry).unwrap();
    let result = default_engine().run(&batch).unwrap();

    let site_rows = result.level(AggregationLevel::Site).unwrap().num_rows() as f64;
    let total_high = string_values(&result.subjects, RISK_CATEGORY)
        .iter()
        .filter(|c| *c == "High")
        .count() as f64;

    for level in [
        AggregationLevel::Study,
        AggregationLevel::Region,
        AggregationLevel::Country,
    ] {
        let table = result.level(level).unwrap();
        assert!(table.num_rows() > 0, "{level} is empty");
        let subjects: f64 = f64_values(table, SUBJECT_COUNT).iter().sum();
        let sites: f64 = f64_values(table, SITE_COUNT).iter().sum();
        let high: f64 = f64_values(table, HIGH_RISK_COUNT).iter().sum();
        assert_eq!(subjects, 600.0, "{level} subject count");
        assert_eq!(sites, site_rows, "{level} site count");
        assert_eq!(high, total_high, "{level} high risk count");
    }
}

#[test]
fn test_high_risk_rate_is_a_fraction() {
    let registry = WeightRegistry::default();
    let batch = generate_subject_table(800, 9, &registry).unwrap();
    let result = default_engine().run(&batch).unwrap();

    for table in &result.levels {
        for rate in f64_values(&table.batch, HIGH_RISK_RATE) {
            assert!((0.0..=1.0).contains(&rate), "{} rate {rate}", table.level);
        }
        let categories = string_values(&table.batch, RISK_CATEGORY);
        assert!(
            categories
                .iter()
                .all(|c| ["Low", "Medium", "High"].contains(&c.as_str()))
        );
    }
    assert_eq!(result.thresholds.len(), 1 + AggregationLevel::ALL.len());
}

#[test]
fn test_missing_region_skips_region_level() {
    let batch = subject_batch(
        &FOUR_SUBJECTS,
        &[
            ("open_queries", vec![4.0, 1.0, 0.0, 2.0]),
            ("missing_pages", vec![0.0, 3.0, 1.0, 0.0]),
        ],
        false,
    );
    let result = small_engine().run(&batch).unwrap();

    let region = result.level(AggregationLevel::Region).unwrap();
    assert_eq!(region.num_rows(), 0);
    assert!(region.schema().field_with_name(REGION).is_ok());
    assert!(
        result
            .issues
            .for_scope("region")
            .any(|i| i.kind == IssueKind::SchemaGap)
    );
    assert!(!result.thresholds.contains_key("region"));

    // Levels that do not need the region still complete
    assert_eq!(result.level(AggregationLevel::Study).unwrap().num_rows(), 2);
    assert_eq!(result.level(AggregationLevel::Country).unwrap().num_rows(), 3);
}

#[test]
fn test_missing_site_skips_every_level() {
    let batch = subject_batch(
        &FOUR_SUBJECTS,
        &[
            ("open_queries", vec![4.0, 1.0, 0.0, 2.0]),
            ("missing_pages", vec![0.0, 3.0, 1.0, 0.0]),
        ],
        true,
    );
    let site_idx = batch.schema().index_of(SITE_ID).unwrap();
    let batch = batch.project(
        &(0..batch.num_columns())
            .filter(|i| *i != site_idx)
            .collect::<Vec<_>>(),
    )
    .unwrap();

    let result = small_engine().run(&batch).unwrap();
    assert_eq!(result.subjects.num_rows(), 4);
    assert!(result.levels.iter().all(|l| l.is_skipped()));
    assert_eq!(result.thresholds.len(), 1);
}

/// A site id that cannot be read as text skips the site-based levels without failing the run
#[test]
fn test_unreadable_site_id_skips_levels() {
    let batch = subject_batch(
        &FOUR_SUBJECTS,
        &[
            ("open_queries", vec![4.0, 1.0, 0.0, 2.0]),
            ("missing_pages", vec![0.0, 3.0, 1.0, 0.0]),
        ],
        true,
    );
    let site_ids = StructArray::from(vec![(
        Arc::new(Field::new("code", DataType::Int32, false)),
        Arc::new(Int32Array::from(vec![1, 2, 2, 1])) as ArrayRef,
    )]);
    let batch = with_replaced_columns(
        &batch,
        vec![(
            Field::new(SITE_ID, site_ids.data_type().clone(), false),
            Arc::new(site_ids) as ArrayRef,
        )],
    )
    .unwrap();

    let result = small_engine().run(&batch).unwrap();
    assert_eq!(result.subjects.num_rows(), 4);
    assert_eq!(f64_values(&result.subjects, DQI_SCORE).len(), 4);
    assert!(result.levels.iter().all(|l| l.is_skipped()));
    assert!(
        result
            .issues
            .for_scope(SITE_ID)
            .any(|i| i.kind == IssueKind::SchemaGap)
    );
}
