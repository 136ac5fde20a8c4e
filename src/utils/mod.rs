//! Shared utilities: Arrow column handling, logging and statistics

pub mod arrow;
pub mod logging;
pub mod stats;

pub use logging::{log_stage_complete, log_stage_start, log_warning};
