//! Async Parquet reading
//!
//! Streams a subject table without blocking the runtime, for callers that
//! load inputs from inside an async service.

use std::path::Path;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use tokio::fs::File;

use crate::error::Result;
use crate::io::parquet::{DEFAULT_BATCH_SIZE, get_batch_size};
use crate::utils::log_stage_complete;

/// Read a Parquet file asynchronously into one record batch
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid Parquet
pub async fn read_subject_table_async(path: &Path) -> Result<RecordBatch> {
    let start = std::time::Instant::now();
    log::info!("Reading subject table asynchronously {}", path.display());

    let file = File::open(path).await?;
    let builder = ParquetRecordBatchStreamBuilder::new(file).await?;
    let schema = builder.schema().clone();
    let stream = builder
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let batches: Vec<RecordBatch> = stream.try_collect().await?;
    let table = concat_batches(&schema, &batches)?;

    log_stage_complete("reading subject table", table.num_rows(), Some(start.elapsed()));
    Ok(table)
}
