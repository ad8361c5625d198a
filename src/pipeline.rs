//! The full preparation run: load, clean, derive, filter, deduplicate.

use std::time::Instant;

use serde::Serialize;

use crate::clean::{drop_duplicates, drop_missing_ratings};
use crate::config::PipelineConfig;
use crate::derive::{RowIssue, derive_all};
use crate::eligibility::{RuleOutcome, apply_rules, default_rules};
use crate::error::Result;
use crate::loader::load_workbook;
use crate::models::{EmployeeRecord, PreparedRecord};
use crate::reader::WorkbookSource;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Row counts and dropped rows of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Where the data came from
    pub source: String,
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Rows in the roster sheet
    pub roster_rows: usize,
    /// Rows in the outcomes sheet
    pub outcome_rows: usize,
    /// Rows after the join
    pub joined_rows: usize,
    /// Rows dropped for a missing performance rating
    pub missing_rating_dropped: usize,
    /// Rows dropped because a field could not be parsed (lenient mode only)
    pub malformed_dropped: usize,
    /// Rows removed by each eligibility rule, in order
    pub eligibility: Vec<RuleOutcome>,
    /// Exact duplicates removed
    pub duplicates_removed: usize,
    /// Rows in the prepared table
    pub final_rows: usize,
    /// Details of the malformed rows
    pub issues: Vec<RowIssue>,
}

/// Prepared table with its run report
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Analysis-ready records, in roster order
    pub records: Vec<PreparedRecord>,
    /// What the run did
    pub report: RunReport,
}

/// Run every stage on a workbook
///
/// The result depends only on the workbook contents and the
/// configuration; running twice gives the same table.
pub fn run_pipeline<W>(source: &mut W, config: &PipelineConfig) -> Result<PipelineOutput>
where
    W: WorkbookSource + ?Sized,
{
    config.validate()?;
    let start = Instant::now();
    let target = source.describe();
    log_operation_start("Preparing", &target);

    let joined = load_workbook(source, config)?;
    let records = EmployeeRecord::from_joined(&joined, &config.date_format_config)?;

    let (records, missing_rating_dropped) = drop_missing_ratings(records);
    let derivation = derive_all(&records, config)?;
    let (records, eligibility) = apply_rules(derivation.records, &default_rules(config));
    let (records, duplicates_removed) = drop_duplicates(records);

    let report = RunReport {
        source: target.clone(),
        config: config.clone(),
        roster_rows: joined.roster_rows,
        outcome_rows: joined.outcome_rows,
        joined_rows: joined.num_rows(),
        missing_rating_dropped,
        malformed_dropped: derivation.issues.len(),
        eligibility,
        duplicates_removed,
        final_rows: records.len(),
        issues: derivation.issues,
    };

    log_operation_complete("prepared", &target, records.len(), Some(start.elapsed()));
    Ok(PipelineOutput { records, report })
}
