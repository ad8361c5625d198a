//! Configuration for the preparation pipeline.
//!
//! All business constants of the run live here. The defaults reproduce the
//! promotion cycle the data was collected for.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{PrepError, Result};
use crate::schema::date_utils::DateFormatConfig;
use crate::schema::{EMPLOYEE_ID, PERF_RANK_MAX, PERF_RANK_MIN};

/// Sheet holding demographic and organizational attributes
pub const DEFAULT_ROSTER_SHEET: &str = "Employee Roster";

/// Sheet holding mid-cycle performance and promotion attributes
pub const DEFAULT_OUTCOMES_SHEET: &str = "Mid-Year Outcomes";

/// Effective date of the promotion cycle; tenure is measured up to it
pub const DEFAULT_CUTOFF_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2023, 9, 30) {
    Some(date) => date,
    None => panic!("invalid default cutoff date"),
};

/// Minimum tenure, in years, for promotion eligibility
pub const DEFAULT_MIN_TENURE_YEARS: f64 = 1.0;

/// Performance ranks treated as non-performers
pub const DEFAULT_EXCLUDED_PERF_RANKS: [u8; 2] = [1, 2];

/// How row-level parse failures are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Abort the run on the first malformed row
    #[default]
    Strict,
    /// Drop malformed rows and record them in the run report
    Lenient,
}

/// Configuration for the preparation pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Name of the roster sheet
    pub roster_sheet: String,
    /// Name of the outcomes sheet
    pub outcomes_sheet: String,
    /// Column both sheets are joined on
    pub key_column: String,
    /// Reference date for tenure
    pub cutoff_date: NaiveDate,
    /// Rows with a shorter tenure are excluded
    pub min_tenure_years: f64,
    /// Performance ranks excluded as non-performers
    pub excluded_perf_ranks: Vec<u8>,
    /// Strict or lenient handling of malformed rows
    pub parse_mode: ParseMode,
    /// Date formats tried when dates arrive as text
    #[serde(skip)]
    pub date_format_config: DateFormatConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roster_sheet: DEFAULT_ROSTER_SHEET.to_string(),
            outcomes_sheet: DEFAULT_OUTCOMES_SHEET.to_string(),
            key_column: EMPLOYEE_ID.to_string(),
            cutoff_date: DEFAULT_CUTOFF_DATE,
            min_tenure_years: DEFAULT_MIN_TENURE_YEARS,
            excluded_perf_ranks: DEFAULT_EXCLUDED_PERF_RANKS.to_vec(),
            parse_mode: ParseMode::Strict,
            date_format_config: DateFormatConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Same configuration with lenient row handling
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.parse_mode = ParseMode::Lenient;
        self
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.roster_sheet.trim().is_empty() || self.outcomes_sheet.trim().is_empty() {
            return Err(PrepError::config("sheet names must not be empty"));
        }
        if self.roster_sheet == self.outcomes_sheet {
            return Err(PrepError::config(format!(
                "roster and outcomes sheets are both '{}'",
                self.roster_sheet
            )));
        }
        if self.key_column.trim().is_empty() {
            return Err(PrepError::config("key column must not be empty"));
        }
        if !self.min_tenure_years.is_finite() || self.min_tenure_years < 0.0 {
            return Err(PrepError::config(format!(
                "minimum tenure must be a non-negative number, got {}",
                self.min_tenure_years
            )));
        }
        if let Some(rank) = self
            .excluded_perf_ranks
            .iter()
            .find(|rank| !(PERF_RANK_MIN..=PERF_RANK_MAX).contains(*rank))
        {
            return Err(PrepError::config(format!(
                "excluded performance rank {rank} is outside {PERF_RANK_MIN}-{PERF_RANK_MAX}"
            )));
        }
        Ok(())
    }
}
