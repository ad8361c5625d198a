//! Row cleaning: incomplete ratings before derivation, duplicates after.

use itertools::Itertools;

use crate::models::{EmployeeRecord, PreparedRecord};
use crate::utils::logging::log_rows_dropped;

/// Drop rows without a performance rating
///
/// Returns the kept rows and the number dropped. No value is imputed.
/// Only null ratings are missing; a blank rating is kept and fails to
/// parse during derivation.
#[must_use]
pub fn drop_missing_ratings(records: Vec<EmployeeRecord>) -> (Vec<EmployeeRecord>, usize) {
    let before = records.len();
    let kept: Vec<EmployeeRecord> = records
        .into_iter()
        .filter(|record| record.perf_rating.is_some())
        .collect();
    let dropped = before - kept.len();
    log_rows_dropped("Cleaner", "missing perf_rating", dropped, kept.len());
    (kept, dropped)
}

/// Drop exact duplicate rows, keeping the first occurrence
///
/// Rows are compared on every field except `employee_id`, passthrough
/// columns included. The flag
/// fields `perf_rank`, `is_men` and `is_promo` cannot be missing on a
/// prepared record, so no null check is needed here.
#[must_use]
pub fn drop_duplicates(records: Vec<PreparedRecord>) -> (Vec<PreparedRecord>, usize) {
    let before = records.len();
    let kept: Vec<PreparedRecord> = records
        .into_iter()
        .unique_by(PreparedRecord::fingerprint)
        .collect();
    let dropped = before - kept.len();
    log_rows_dropped("Cleaner", "duplicate rows", dropped, kept.len());
    (kept, dropped)
}
