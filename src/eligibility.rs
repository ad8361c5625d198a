//! Promotion eligibility rules.
//!
//! Each rule decides for one prepared record whether it stays in the
//! table. Rules are applied in order and each reports how many rows it
//! removed.

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::models::PreparedRecord;
use crate::utils::logging::log_rows_dropped;

/// Criterion a record must meet to stay in the prepared table
pub trait EligibilityRule: Send + Sync {
    /// Short description used in logs and the run report
    fn describe(&self) -> String;

    /// Determine if a record meets the criterion
    fn meets_criteria(&self, record: &PreparedRecord) -> bool;
}

/// Excludes non-performers by performance rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonPerformerRule {
    excluded_ranks: Vec<u8>,
}

impl NonPerformerRule {
    /// Exclude the given ranks
    #[must_use]
    pub fn new(excluded_ranks: impl Into<Vec<u8>>) -> Self {
        Self {
            excluded_ranks: excluded_ranks.into(),
        }
    }
}

impl EligibilityRule for NonPerformerRule {
    fn describe(&self) -> String {
        format!("perf_rank not in {:?}", self.excluded_ranks)
    }

    fn meets_criteria(&self, record: &PreparedRecord) -> bool {
        !self.excluded_ranks.contains(&record.perf_rank)
    }
}

/// Excludes records with less tenure than a threshold
///
/// A record without tenure fails the rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinTenureRule {
    min_years: f64,
}

impl MinTenureRule {
    /// Require at least `min_years` of tenure
    #[must_use]
    pub fn new(min_years: f64) -> Self {
        Self { min_years }
    }
}

impl EligibilityRule for MinTenureRule {
    fn describe(&self) -> String {
        format!("tenure >= {}", self.min_years)
    }

    fn meets_criteria(&self, record: &PreparedRecord) -> bool {
        record.tenure.is_some_and(|tenure| tenure >= self.min_years)
    }
}

/// Rows removed by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    /// Rule description
    pub rule: String,
    /// Rows the rule excluded
    pub excluded: usize,
}

/// The configured rules: non-performers first, then minimum tenure
#[must_use]
pub fn default_rules(config: &PipelineConfig) -> Vec<Box<dyn EligibilityRule>> {
    vec![
        Box::new(NonPerformerRule::new(config.excluded_perf_ranks.clone())),
        Box::new(MinTenureRule::new(config.min_tenure_years)),
    ]
}

/// Apply rules in order, keeping the records that meet all of them
#[must_use]
pub fn apply_rules(
    mut records: Vec<PreparedRecord>,
    rules: &[Box<dyn EligibilityRule>],
) -> (Vec<PreparedRecord>, Vec<RuleOutcome>) {
    let mut outcomes = Vec::with_capacity(rules.len());
    for rule in rules {
        let before = records.len();
        records.retain(|record| rule.meets_criteria(record));
        let excluded = before - records.len();
        let description = rule.describe();
        log_rows_dropped("Eligibility", &description, excluded, records.len());
        outcomes.push(RuleOutcome {
            rule: description,
            excluded,
        });
    }
    (records, outcomes)
}
