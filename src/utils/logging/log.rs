//! Logging utilities
//!
//! Standardized messages for the start and end of pipeline operations.

use std::time::Duration;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - What is being operated on (a path, a sheet, a stage)
pub fn log_operation_start(operation: &str, target: &str) {
    log::info!("{operation} {target}");
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - What was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, target: &str, items: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Successfully {operation} {items} rows from {target} in {duration:?}");
    } else {
        log::info!("Successfully {operation} {items} rows from {target}");
    }
}

/// Log how many rows a stage removed, and why
pub fn log_rows_dropped(stage: &str, reason: &str, dropped: usize, remaining: usize) {
    if dropped > 0 {
        log::info!("{stage}: dropped {dropped} rows ({reason}), {remaining} remain");
    } else {
        log::debug!("{stage}: no rows dropped ({reason}), {remaining} remain");
    }
}
