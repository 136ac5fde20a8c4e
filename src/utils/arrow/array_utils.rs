//! Utilities for working with Arrow arrays.
//!
//! This module provides helpers for locating, casting and downcasting
//! columns of a record batch, and for assembling new batches from existing
//! ones without mutating them.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::compute::kernels::cast::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{DqiError, Result};

/// Get a column from a record batch, cast to the expected data type
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column array (converted if necessary) if found
/// * `Ok(None)` - If the column is not present
/// * `Err(DqiError)` - If the column exists but cannot be cast
pub fn get_column(
    batch: &RecordBatch,
    column_name: &str,
    expected_type: &DataType,
) -> Result<Option<ArrayRef>> {
    let Ok(idx) = batch.schema().index_of(column_name) else {
        return Ok(None);
    };

    let column = batch.column(idx);
    let actual_type = column.data_type();
    if actual_type == expected_type {
        return Ok(Some(Arc::clone(column)));
    }

    debug!("Casting column '{column_name}' from {actual_type:?} to {expected_type:?}");
    let converted = cast(column, expected_type)?;
    Ok(Some(converted))
}

/// Downcast a column to a specific array type with a clear error message
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        DqiError::Schema(format!(
            "column '{column_name}' could not be read as {expected_type_name}"
        ))
    })
}

/// Build a new batch from `batch` with `columns` appended
///
/// Existing columns that share a name with an appended column are dropped
/// first, so re-deriving columns on an already-derived table replaces them.
pub fn with_replaced_columns(
    batch: &RecordBatch,
    columns: Vec<(Field, ArrayRef)>,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len() + columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (idx, field) in schema.fields().iter().enumerate() {
        if columns.iter().any(|(f, _)| f.name() == field.name()) {
            continue;
        }
        fields.push(field.as_ref().clone());
        arrays.push(Arc::clone(batch.column(idx)));
    }
    for (field, array) in columns {
        fields.push(field);
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(schema, arrays)?)
}
