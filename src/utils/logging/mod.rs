//! Logging utilities for pipeline progress
//!
//! Thin wrappers over the `log` macros so every stage reports in the same shape.

pub mod log;

pub use log::{log_operation_complete, log_operation_start, log_rows_dropped};
