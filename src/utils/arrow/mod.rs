//! Arrow data handling utilities
//!
//! Helpers for column lookup, type casting, extraction into plain vectors,
//! and building derived record batches.

pub mod array_utils;
pub mod extractors;

pub use array_utils::{downcast_array, get_column, with_replaced_columns};
pub use extractors::{Float64Column, UNKNOWN_IDENTIFIER, extract_float64, extract_string};
