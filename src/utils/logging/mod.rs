//! Logging utilities for stage reporting and progress tracking

pub mod log;
pub mod progress;

pub use log::{log_stage_complete, log_stage_start, log_warning};
pub use progress::{create_level_progress_bar, finish_progress_bar};
