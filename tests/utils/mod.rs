use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dqi_engine::schema::{COUNTRY, REGION, SITE_ID, STUDY, SUBJECT_ID};

/// Identifier columns of one test subject: `(study, subject_id, site_id, country, region)`
pub type SubjectIds<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

/// Build a subject table from identifiers and named feature columns
///
/// Pass `with_region = false` to leave the region column out entirely.
#[must_use]
pub fn subject_batch(
    ids: &[SubjectIds<'_>],
    features: &[(&str, Vec<f64>)],
    with_region: bool,
) -> RecordBatch {
    let mut fields = vec![
        Field::new(STUDY, DataType::Utf8, false),
        Field::new(SUBJECT_ID, DataType::Utf8, false),
        Field::new(SITE_ID, DataType::Utf8, false),
        Field::new(COUNTRY, DataType::Utf8, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(ids.iter().map(|r| r.0))),
        Arc::new(StringArray::from_iter_values(ids.iter().map(|r| r.1))),
        Arc::new(StringArray::from_iter_values(ids.iter().map(|r| r.2))),
        Arc::new(StringArray::from_iter_values(ids.iter().map(|r| r.3))),
    ];
    if with_region {
        fields.push(Field::new(REGION, DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from_iter_values(ids.iter().map(|r| r.4))));
    }
    for (name, values) in features {
        fields.push(Field::new(*name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(values.clone())));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
}

/// Values of a Float64 column
#[must_use]
pub fn f64_values(batch: &RecordBatch, name: &str) -> Vec<f64> {
    let column = batch.column_by_name(name).unwrap();
    let column = arrow::compute::cast(column, &DataType::Float64).unwrap();
    let array = column.as_any().downcast_ref::<Float64Array>().unwrap();
    (0..array.len()).map(|i| array.value(i)).collect()
}

/// Values of a Utf8 column
#[must_use]
pub fn string_values(batch: &RecordBatch, name: &str) -> Vec<String> {
    let array = batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    (0..array.len()).map(|i| array.value(i).to_string()).collect()
}

/// Print summary information about a table
pub fn print_batch_summary(label: &str, batch: &RecordBatch) {
    println!("{label}: {} rows, {} columns", batch.num_rows(), batch.num_columns());
    for field in batch.schema().fields() {
        println!("  - {} ({:?})", field.name(), field.data_type());
    }
}
