mod common;

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use chrono::NaiveDate;
use common::{
    OUTCOMES, ROSTER, outcome_rows, outcomes_batch, roster_batch, roster_rows, with_column, workbook,
};
use promo_prep::analysis::{Dimension, group_rates, promotion_rate};
use promo_prep::features::{DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION, prepare_model_input};
use promo_prep::{MemoryWorkbook, ParquetWorkbook, PipelineConfig, PrepError, run_pipeline};

fn ids(records: &[promo_prep::PreparedRecord]) -> Vec<&str> {
    records.iter().map(|r| r.employee_id.as_str()).collect()
}

#[test]
fn prepares_the_eligible_employees() {
    let output = run_pipeline(&mut workbook(), &PipelineConfig::default()).unwrap();
    assert_eq!(ids(&output.records), vec!["1", "5", "9"]);

    let first = &output.records[0];
    assert_eq!(first.hire_date, NaiveDate::from_ymd_opt(2020, 1, 15));
    assert_eq!(first.age, Some(34.2));
    assert_eq!(first.job_role, "M");
    assert_eq!(first.job_rank, 3);
    assert_eq!(first.is_men, 1);
    assert_eq!(first.is_promo, 1);
    assert_eq!(first.perf_rank, 4);
    assert_eq!(first.tenure, Some(3.7));

    // Any recorded decision counts, whatever it says
    assert_eq!(output.records[2].is_promo, 1);
    assert_eq!(output.records[1].is_promo, 0);
}

fn workbook_from(
    roster: &[common::RosterRow<'_>],
    outcomes: &[common::OutcomeRow<'_>],
) -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet(ROSTER, roster_batch(roster))
        .with_sheet(OUTCOMES, outcomes_batch(outcomes))
}

#[test]
fn gender_must_match_exactly() {
    let mut roster = roster_rows();
    roster[0].4 = Some(" men");
    roster[7].4 = Some("Men");
    let output = run_pipeline(&mut workbook_from(&roster, &outcome_rows()), &PipelineConfig::default())
        .unwrap();
    assert_eq!(ids(&output.records), vec!["1", "5", "9"]);
    for record in &output.records {
        assert_eq!(record.is_men, 0, "employee {}", record.employee_id);
    }
}

#[test]
fn blank_decisions_count_as_promotions() {
    let mut outcomes = outcome_rows();
    outcomes[0].2 = Some(" ");
    outcomes[4].2 = Some("");
    let output = run_pipeline(&mut workbook_from(&roster_rows(), &outcomes), &PipelineConfig::default())
        .unwrap();

    // Employee 8 no longer duplicates 5 once 5 has a decision
    assert_eq!(ids(&output.records), vec!["1", "5", "8", "9"]);
    let promos: Vec<u8> = output.records.iter().map(|r| r.is_promo).collect();
    assert_eq!(promos, vec![1, 1, 0, 1]);
    assert_eq!(output.report.duplicates_removed, 0);
}

#[test]
fn blank_rating_is_malformed_not_missing() {
    let mut outcomes = outcome_rows();
    outcomes[4].1 = Some(" ");

    let err = run_pipeline(&mut workbook_from(&roster_rows(), &outcomes), &PipelineConfig::default())
        .unwrap_err();
    match err {
        PrepError::FormatError { employee_id, field, value, .. } => {
            assert_eq!(employee_id, "5");
            assert_eq!(field, "perf_rating");
            assert_eq!(value.as_deref(), Some(" "));
        }
        other => panic!("unexpected error: {other}"),
    }

    let config = PipelineConfig::default().lenient();
    let output = run_pipeline(&mut workbook_from(&roster_rows(), &outcomes), &config).unwrap();
    assert_eq!(output.report.missing_rating_dropped, 1);
    assert_eq!(output.report.malformed_dropped, 1);
    assert_eq!(output.report.issues[0].employee_id, "5");
    assert_eq!(ids(&output.records), vec!["1", "8", "9"]);
}

fn workbook_with_managers(managers: Vec<Option<&str>>) -> MemoryWorkbook {
    let roster = with_column(
        &roster_batch(&roster_rows()),
        "manager",
        Arc::new(StringArray::from(managers)) as ArrayRef,
    );
    MemoryWorkbook::new()
        .with_sheet(ROSTER, roster)
        .with_sheet(OUTCOMES, outcomes_batch(&outcome_rows()))
}

#[test]
fn passthrough_columns_take_part_in_deduplication() {
    // Employees 5 and 8 differ only in their manager
    let managers = vec![
        Some("Cleo"),
        None,
        None,
        None,
        Some("Alice"),
        None,
        Some("Bob"),
        Some("Cleo"),
        None,
    ];
    let output = run_pipeline(&mut workbook_with_managers(managers), &PipelineConfig::default())
        .unwrap();
    assert_eq!(ids(&output.records), vec!["1", "5", "8", "9"]);
    assert_eq!(output.report.duplicates_removed, 0);
    assert_eq!(output.records[1].extra["manager"].as_deref(), Some("Alice"));
    assert_eq!(output.records[2].extra["manager"].as_deref(), Some("Bob"));

    let batch = promo_prep::PreparedRecord::to_record_batch(&output.records).unwrap();
    assert!(batch.schema().field_with_name("manager").is_ok());
}

#[test]
fn matching_passthrough_columns_still_deduplicate() {
    let managers = vec![None, None, None, None, Some("Alice"), None, Some("Alice"), None, None];
    let output = run_pipeline(&mut workbook_with_managers(managers), &PipelineConfig::default())
        .unwrap();
    assert_eq!(ids(&output.records), vec!["1", "5", "9"]);
    assert_eq!(output.report.duplicates_removed, 1);
}

#[test]
fn report_counts_every_stage() {
    let report = run_pipeline(&mut workbook(), &PipelineConfig::default())
        .unwrap()
        .report;
    assert_eq!(report.roster_rows, 9);
    assert_eq!(report.outcome_rows, 9);
    assert_eq!(report.joined_rows, 8);
    assert_eq!(report.missing_rating_dropped, 1);
    assert_eq!(report.malformed_dropped, 0);
    assert_eq!(report.eligibility.len(), 2);
    assert_eq!(report.eligibility[0].excluded, 1);
    assert_eq!(report.eligibility[1].excluded, 2);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.final_rows, 3);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["config"]["cutoff_date"], "2023-09-30");
    assert_eq!(json["config"]["parse_mode"], "strict");
}

#[test]
fn join_keeps_only_ids_in_both_sheets() {
    let output = run_pipeline(&mut workbook(), &PipelineConfig::default()).unwrap();
    let kept = ids(&output.records);
    assert!(!kept.contains(&"6"));
    assert!(!kept.contains(&"7"));
    let mut unique = kept.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), kept.len());
}

#[test]
fn retained_rows_satisfy_eligibility() {
    let output = run_pipeline(&mut workbook(), &PipelineConfig::default()).unwrap();
    for record in &output.records {
        assert!((3..=5).contains(&record.perf_rank));
        assert!(record.tenure.is_some_and(|t| t >= 1.0));
    }
    // "2 - Below" is gone
    assert!(!ids(&output.records).contains(&"2"));
}

#[test]
fn runs_are_idempotent() {
    let config = PipelineConfig::default();
    let first = run_pipeline(&mut workbook(), &config).unwrap();
    let second = run_pipeline(&mut workbook(), &config).unwrap();
    assert_eq!(first.records, second.records);
}

fn workbook_with_bad_level() -> MemoryWorkbook {
    let mut roster = roster_rows();
    roster.push((11, Some("2015-01-01"), Some(52.0), Some("M10"), Some("men"), Some("East"), Some("IT")));
    let mut outcomes = outcome_rows();
    outcomes.push((11, Some("4 - Exceeds"), None));
    MemoryWorkbook::new()
        .with_sheet(ROSTER, roster_batch(&roster))
        .with_sheet(OUTCOMES, outcomes_batch(&outcomes))
}

#[test]
fn strict_mode_fails_on_malformed_rows() {
    let err = run_pipeline(&mut workbook_with_bad_level(), &PipelineConfig::default()).unwrap_err();
    match err {
        PrepError::FormatError {
            employee_id,
            field,
            value,
            ..
        } => {
            assert_eq!(employee_id, "11");
            assert_eq!(field, "job_level");
            assert_eq!(value.as_deref(), Some("M10"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn lenient_mode_reports_malformed_rows() {
    let config = PipelineConfig::default().lenient();
    let output = run_pipeline(&mut workbook_with_bad_level(), &config).unwrap();
    assert_eq!(ids(&output.records), vec!["1", "5", "9"]);
    assert_eq!(output.report.malformed_dropped, 1);
    assert_eq!(output.report.issues[0].employee_id, "11");
    assert_eq!(output.report.issues[0].field, "job_level");
}

#[test]
fn higher_tenure_threshold_excludes_more() {
    let config = PipelineConfig {
        min_tenure_years: 5.5,
        ..Default::default()
    };
    let output = run_pipeline(&mut workbook(), &config).unwrap();
    assert_eq!(ids(&output.records), vec!["9"]);
}

#[test]
fn invalid_config_is_rejected_before_loading() {
    let config = PipelineConfig {
        min_tenure_years: -1.0,
        ..Default::default()
    };
    let err = run_pipeline(&mut MemoryWorkbook::new(), &config).unwrap_err();
    assert!(matches!(err, PrepError::ConfigError(_)));
}

#[test]
fn parquet_workbook_gives_the_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut parquet = ParquetWorkbook::open(dir.path()).unwrap();
    parquet.write_sheet(ROSTER, &roster_batch(&roster_rows())).unwrap();
    parquet.write_sheet(OUTCOMES, &outcomes_batch(&outcome_rows())).unwrap();

    let config = PipelineConfig::default();
    let from_parquet = run_pipeline(&mut parquet, &config).unwrap();
    let from_memory = run_pipeline(&mut workbook(), &config).unwrap();
    assert_eq!(from_parquet.records, from_memory.records);
}

#[test]
fn consumers_read_the_prepared_table() {
    let output = run_pipeline(&mut workbook(), &PipelineConfig::default()).unwrap();
    let records = &output.records;

    assert!((promotion_rate(records).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    let by_gender = group_rates(records, &[Dimension::IsMen]);
    assert_eq!(by_gender.len(), 2);
    assert_eq!(by_gender[1].key, vec!["1".to_string()]);
    assert_eq!(by_gender[1].rate, 1.0);

    let input = prepare_model_input(records, DEFAULT_TEST_FRACTION, DEFAULT_SPLIT_SEED).unwrap();
    assert_eq!(input.train.len() + input.test.len(), records.len());
    assert_eq!(input.test.len(), 1);
}
