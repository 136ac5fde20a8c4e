//! Logging utilities
//!
//! This module provides standardized logging functions for engine stages.

use std::time::Duration;

/// Log a stage start with consistent format
///
/// # Arguments
/// * `stage` - Name of the stage (e.g. "Scoring subjects")
/// * `rows` - Number of input rows the stage works on
pub fn log_stage_start(stage: &str, rows: usize) {
    log::info!("{stage} ({rows} rows)");
}

/// Log a stage completion with consistent format
///
/// # Arguments
/// * `stage` - Name of the stage
/// * `items` - Number of items produced
/// * `elapsed` - Optional elapsed time
pub fn log_stage_complete(stage: &str, items: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Completed {stage}: {items} items in {duration:?}");
    } else {
        log::info!("Completed {stage}: {items} items");
    }
}

/// Log a warning with consistent format
pub fn log_warning(message: &str) {
    log::warn!("{message}");
}
