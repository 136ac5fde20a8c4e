//! Column extraction utilities for Arrow record batches
//!
//! Extracts whole columns into plain vectors, applying the engine's
//! null-handling rules.

use arrow::array::{Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{DqiError, Result};
use crate::utils::arrow::array_utils::{downcast_array, get_column};

/// Placeholder used for null identifiers
pub const UNKNOWN_IDENTIFIER: &str = "UNKNOWN";

/// A numeric column read as `f64`, with nulls replaced by zero
#[derive(Debug, Clone, PartialEq)]
pub struct Float64Column {
    pub values: Vec<f64>,
    /// Number of null entries that were replaced by zero
    pub null_count: usize,
}

/// Extract a numeric column as `f64` values
///
/// # Returns
///
/// * `Ok(Some(Float64Column))` - The column, cast to `Float64`, nulls set to 0
/// * `Ok(None)` - If the column is not present
/// * `Err` - If the column is not numeric or cannot be cast to `Float64`
pub fn extract_float64(batch: &RecordBatch, column_name: &str) -> Result<Option<Float64Column>> {
    let schema = batch.schema();
    let Ok(field) = schema.field_with_name(column_name) else {
        return Ok(None);
    };
    let source_type = field.data_type();
    if !(source_type.is_numeric() || *source_type == DataType::Boolean) {
        return Err(DqiError::Schema(format!(
            "column '{column_name}' has non-numeric type {source_type:?}"
        )));
    }

    let Some(array) = get_column(batch, column_name, &DataType::Float64)? else {
        return Ok(None);
    };
    let floats = downcast_array::<Float64Array>(&array, column_name, "Float64")?;

    let values = (0..floats.len())
        .map(|i| if floats.is_null(i) { 0.0 } else { floats.value(i) })
        .collect();

    Ok(Some(Float64Column {
        values,
        null_count: floats.null_count(),
    }))
}

/// Extract a string column, replacing nulls and empty strings with
/// [`UNKNOWN_IDENTIFIER`]
pub fn extract_string(batch: &RecordBatch, column_name: &str) -> Result<Option<Vec<String>>> {
    let Some(array) = get_column(batch, column_name, &DataType::Utf8)? else {
        return Ok(None);
    };
    let strings = downcast_array::<StringArray>(&array, column_name, "String")?;

    let values = (0..strings.len())
        .map(|i| {
            if strings.is_null(i) || strings.value(i).is_empty() {
                UNKNOWN_IDENTIFIER.to_string()
            } else {
                strings.value(i).to_string()
            }
        })
        .collect();

    Ok(Some(values))
}
