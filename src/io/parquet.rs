//! Parquet file operations
//!
//! Reads a subject table snapshot into a single record batch and writes the
//! engine's output tables back to Parquet.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::Result;
use crate::utils::{log_stage_complete, log_stage_start};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Batch size from the `DQI_BATCH_SIZE` environment variable, if set
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("DQI_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
}

/// Read a Parquet file into one record batch
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid Parquet
pub fn read_subject_table(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();
    log::info!("Reading subject table {}", path.display());

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    let table = concat_batches(&schema, &batches)?;

    log_stage_complete("reading subject table", table.num_rows(), Some(start.elapsed()));
    Ok(table)
}

/// Write a record batch to a Parquet file, replacing any existing file
pub fn write_table(path: &Path, batch: &RecordBatch) -> Result<()> {
    log_stage_start(&format!("Writing {}", path.display()), batch.num_rows());

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
