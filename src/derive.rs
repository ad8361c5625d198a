//! Feature derivation: turn raw employee records into prepared records.
//!
//! Every derived field is a pure function of fields already on the row.
//! Rows are independent, so derivation runs on a rayon parallel iterator;
//! results come back in input order.

use std::time::Instant;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{ParseMode, PipelineConfig};
use crate::error::{PrepError, Result};
use crate::models::{CodeParseError, EmployeeRecord, JobLevel, PerfRank, PreparedRecord};
use crate::schema::{HIRE_DATE, JOB_LEVEL, PERF_RATING};
use crate::utils::arrow::DateCell;

/// Days per year used for tenure
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Gender value counted as `is_men = 1`
pub const MEN: &str = "men";

/// A row dropped in lenient mode, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// Key of the dropped row
    pub employee_id: String,
    /// Field that failed to parse
    pub field: &'static str,
    /// Raw value of that field
    pub value: Option<String>,
    /// Parse failure
    pub reason: String,
}

impl RowIssue {
    /// Build an issue from a row-level error; other errors yield `None`
    #[must_use]
    pub fn from_error(error: &PrepError) -> Option<Self> {
        match error {
            PrepError::FormatError {
                employee_id,
                field,
                value,
                reason,
            } => Some(Self {
                employee_id: employee_id.clone(),
                field: *field,
                value: value.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Records that derived cleanly, plus the rows dropped in lenient mode
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    /// Prepared records, in input order
    pub records: Vec<PreparedRecord>,
    /// Rows dropped because a field could not be parsed
    pub issues: Vec<RowIssue>,
}

/// Round to one decimal, ties to even
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Any recorded decision counts as a promotion
#[must_use]
pub fn is_promo(promo_decision: Option<&str>) -> bool {
    promo_decision.is_some()
}

/// Exact, case-sensitive match on `men`
#[must_use]
pub fn is_men(gender: Option<&str>) -> bool {
    gender == Some(MEN)
}

/// Years between hire date and cutoff, one decimal
#[must_use]
pub fn tenure_years(cutoff: NaiveDate, hire_date: NaiveDate) -> f64 {
    tenure_years_since(cutoff, hire_date.and_time(NaiveTime::MIN))
}

/// Years between a hire time and midnight on the cutoff, one decimal
///
/// Elapsed time is floored to whole days first, so a hire later in the
/// day counts one day fewer than a hire at midnight.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tenure_years_since(cutoff: NaiveDate, hired_at: NaiveDateTime) -> f64 {
    let elapsed = cutoff.and_time(NaiveTime::MIN) - hired_at;
    let mut days = elapsed.num_days();
    if elapsed < Duration::days(days) {
        days -= 1;
    }
    round1(days as f64 / DAYS_PER_YEAR)
}

fn format_error(
    employee_id: &str,
    field: &'static str,
    value: Option<&str>,
    reason: impl ToString,
) -> PrepError {
    PrepError::FormatError {
        employee_id: employee_id.to_string(),
        field,
        value: value.map(str::to_string),
        reason: reason.to_string(),
    }
}

fn parse_code<T>(employee_id: &str, field: &'static str, value: Option<&str>) -> Result<T>
where
    T: std::str::FromStr<Err = CodeParseError>,
{
    let text = value.ok_or_else(|| format_error(employee_id, field, None, CodeParseError::Empty))?;
    text.parse()
        .map_err(|err: CodeParseError| format_error(employee_id, field, value, err))
}

/// Derive one prepared record
///
/// Fails with a format error when `job_level`, `perf_rating` or a textual
/// `hire_date` does not parse.
pub fn derive_record(record: &EmployeeRecord, config: &PipelineConfig) -> Result<PreparedRecord> {
    let id = record.employee_id.as_str();

    let job_level: JobLevel = parse_code(id, JOB_LEVEL, record.job_level.as_deref())?;
    let perf_rank: PerfRank = parse_code(id, PERF_RATING, record.perf_rating.as_deref())?;
    let hired_at = match &record.hire_date {
        DateCell::Unparsed(text) => {
            return Err(format_error(
                id,
                HIRE_DATE,
                Some(text.as_str()),
                "no configured date format matches",
            ));
        }
        cell => cell.datetime(),
    };

    Ok(PreparedRecord::new(
        record.employee_id.clone(),
        hired_at.map(|datetime| datetime.date()),
        record.age.map(round1),
        job_level,
        record.region.clone(),
        record.job_function.clone(),
        is_promo(record.promo_decision.as_deref()),
        is_men(record.gender.as_deref()),
        perf_rank,
        hired_at.map(|datetime| tenure_years_since(config.cutoff_date, datetime)),
    )
    .with_extra(record.extra.clone()))
}

/// Derive every record
///
/// In strict mode the first failing row, in input order, aborts the run.
/// In lenient mode failing rows are dropped and reported.
pub fn derive_all(records: &[EmployeeRecord], config: &PipelineConfig) -> Result<Derivation> {
    let start = Instant::now();
    let results: Vec<Result<PreparedRecord>> = records
        .par_iter()
        .map(|record| derive_record(record, config))
        .collect();

    let mut derivation = Derivation::default();
    for result in results {
        match result {
            Ok(record) => derivation.records.push(record),
            Err(err) if config.parse_mode == ParseMode::Lenient => {
                let Some(issue) = RowIssue::from_error(&err) else {
                    return Err(err);
                };
                log::warn!(
                    "Dropping employee {}: {} {:?} ({})",
                    issue.employee_id,
                    issue.field,
                    issue.value,
                    issue.reason
                );
                derivation.issues.push(issue);
            }
            Err(err) => return Err(err),
        }
    }

    log::debug!(
        "Derived {} records ({} dropped) in {:?}",
        derivation.records.len(),
        derivation.issues.len(),
        start.elapsed()
    );
    Ok(derivation)
}
