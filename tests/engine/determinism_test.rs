use std::collections::BTreeMap;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::record_batch::RecordBatch;
use dqi_engine::schema::{DQI_SCORE, RISK_CATEGORY, SUBJECT_ID};
use dqi_engine::{DqiEngine, DqiResult, EngineConfig, WeightRegistry, generate_subject_table};

use crate::utils::{f64_values, string_values};

fn engine() -> DqiEngine {
    DqiEngine::new(WeightRegistry::default(), EngineConfig::default()).unwrap()
}

/// Reorder rows with a fixed permutation that interleaves the two halves in reverse
fn shuffled(batch: &RecordBatch) -> RecordBatch {
    let n = batch.num_rows() as u32;
    let indices: Vec<u32> = (0..n)
        .rev()
        .filter(|i| i % 2 == 0)
        .chain((0..n).filter(|i| i % 2 == 1))
        .collect();
    let indices = UInt32Array::from(indices);
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None).unwrap())
        .collect();
    RecordBatch::try_new(batch.schema(), columns).unwrap()
}

fn subject_outcomes(result: &DqiResult) -> BTreeMap<String, (f64, String)> {
    let ids = string_values(&result.subjects, SUBJECT_ID);
    let scores = f64_values(&result.subjects, DQI_SCORE);
    let categories = string_values(&result.subjects, RISK_CATEGORY);
    ids.into_iter()
        .zip(scores.into_iter().zip(categories))
        .collect()
}

#[test]
fn test_row_order_does_not_change_results() {
    let batch = generate_subject_table(400, 21, &WeightRegistry::default()).unwrap();
    let engine = engine();

    let original = engine.run(&batch).unwrap();
    let reordered = engine.run(&shuffled(&batch)).unwrap();

    assert_eq!(subject_outcomes(&original), subject_outcomes(&reordered));
    assert_eq!(original.thresholds, reordered.thresholds);
    for (a, b) in original.levels.iter().zip(&reordered.levels) {
        assert_eq!(a.level, b.level);
        assert_eq!(a.batch, b.batch, "{} table depends on row order", a.level);
    }
}

#[test]
fn test_rerun_on_output_is_idempotent() {
    let batch = generate_subject_table(300, 5, &WeightRegistry::default()).unwrap();
    let engine = engine();

    let first = engine.run(&batch).unwrap();
    let second = engine.run(&first.subjects).unwrap();

    assert_eq!(first.subjects, second.subjects);
    assert_eq!(first.thresholds, second.thresholds);
    for (a, b) in first.levels.iter().zip(&second.levels) {
        assert_eq!(a.batch, b.batch, "{} table changed on rerun", a.level);
    }
}

#[test]
fn test_alternate_weights_change_scores_only() {
    let batch = generate_subject_table(200, 8, &WeightRegistry::default()).unwrap();
    let uniform = WeightRegistry::new(
        "uniform",
        WeightRegistry::default()
            .features()
            .iter()
            .cloned()
            .map(|mut f| {
                f.weight = 0.1;
                f
            })
            .collect(),
    );

    let baseline = engine().run(&batch).unwrap();
    let alternate = DqiEngine::new(uniform, EngineConfig::default())
        .unwrap()
        .run(&batch)
        .unwrap();

    assert_eq!(baseline.subjects.num_rows(), alternate.subjects.num_rows());
    assert_ne!(
        f64_values(&baseline.subjects, DQI_SCORE),
        f64_values(&alternate.subjects, DQI_SCORE)
    );
}
