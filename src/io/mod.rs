//! Reading subject tables and writing engine outputs

pub mod async_ops;
pub mod parquet;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub use self::async_ops::read_subject_table_async;
pub use self::parquet::{DEFAULT_BATCH_SIZE, read_subject_table, write_table};

use crate::engine::DqiResult;
use crate::error::Result;
use crate::report::RunReport;

/// Write a report as pretty-printed JSON
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Write every output of a run into `dir`
///
/// Produces `subjects.parquet`, one `<level>.parquet` per aggregation level
/// and `report.json`. Returns the written paths.
pub fn write_outputs(dir: &Path, result: &DqiResult, report: &RunReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(result.levels.len() + 2);

    let subjects = dir.join("subjects.parquet");
    write_table(&subjects, &result.subjects)?;
    written.push(subjects);

    for table in &result.levels {
        let path = dir.join(format!("{}.parquet", table.level.name()));
        write_table(&path, &table.batch)?;
        written.push(path);
    }

    let report_path = dir.join("report.json");
    write_report(&report_path, report)?;
    written.push(report_path);

    Ok(written)
}
