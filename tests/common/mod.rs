//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use promo_prep::{MemoryWorkbook, RecordBatch};

pub const ROSTER: &str = "Employee Roster";
pub const OUTCOMES: &str = "Mid-Year Outcomes";

/// One roster row: id, hire date, age, job level, gender, region, job function
pub type RosterRow<'a> = (
    i64,
    Option<&'a str>,
    Option<f64>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
);

/// One outcomes row: id, performance rating, promotion decision
pub type OutcomeRow<'a> = (i64, Option<&'a str>, Option<&'a str>);

pub fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .unwrap()
}

/// Append a column to a batch
pub fn with_column(base: &RecordBatch, name: &str, array: ArrayRef) -> RecordBatch {
    let schema = base.schema();
    let mut columns: Vec<(&str, ArrayRef)> = schema
        .fields()
        .iter()
        .zip(base.columns())
        .map(|(field, column)| (field.name().as_str(), Arc::clone(column)))
        .collect();
    columns.push((name, array));
    batch(columns)
}

fn texts<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(StringArray::from_iter(values))
}

pub fn roster_batch(rows: &[RosterRow<'_>]) -> RecordBatch {
    batch(vec![
        ("employee_id", Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.0)))),
        ("hire_date", texts(rows.iter().map(|r| r.1))),
        ("age", Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.2)))),
        ("job_level", texts(rows.iter().map(|r| r.3))),
        ("gender", texts(rows.iter().map(|r| r.4))),
        ("region", texts(rows.iter().map(|r| r.5))),
        ("job_function", texts(rows.iter().map(|r| r.6))),
    ])
}

pub fn outcomes_batch(rows: &[OutcomeRow<'_>]) -> RecordBatch {
    batch(vec![
        ("employee_id", Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.0)))),
        ("perf_rating", texts(rows.iter().map(|r| r.1))),
        ("promo_decision", texts(rows.iter().map(|r| r.2))),
    ])
}

pub fn roster_rows() -> Vec<RosterRow<'static>> {
    vec![
        (1, Some("2020-01-15"), Some(34.25), Some("M3"), Some("men"), Some("North"), Some("Sales")),
        (2, Some("2021-06-01"), Some(41.0), Some("P2"), Some("women"), Some("South"), Some("Ops")),
        (3, Some("2023-01-10"), Some(29.0), Some("E1"), Some("men"), Some("East"), Some("IT")),
        (4, Some("2019-03-03"), Some(50.0), Some("M4"), Some("women"), Some("North"), Some("Sales")),
        (5, Some("2018-07-07"), Some(38.0), Some("P3"), Some("women"), Some("West"), Some("Ops")),
        (6, Some("2016-05-05"), Some(47.0), Some("M5"), Some("men"), Some("West"), Some("Sales")),
        (8, Some("2018-07-07"), Some(38.0), Some("P3"), Some("women"), Some("West"), Some("Ops")),
        (9, Some("2017-02-02"), Some(45.5), Some("M2"), Some("men"), Some("South"), Some("IT")),
        (10, None, Some(30.0), Some("P1"), Some("men"), Some("North"), Some("Ops")),
    ]
}

pub fn outcome_rows() -> Vec<OutcomeRow<'static>> {
    vec![
        (1, Some("4 - Exceeds"), Some("Approved")),
        (2, Some("2 - Below"), None),
        (3, Some("5 - Outstanding"), None),
        (4, None, None),
        (5, Some("3 - Meets"), None),
        (7, Some("5 - Outstanding"), Some("Approved")),
        (8, Some("3 - Meets"), None),
        (9, Some("3 - Meets"), Some("Pending")),
        (10, Some("4 - Exceeds"), None),
    ]
}

/// Workbook whose prepared table holds employees 1, 5 and 9
pub fn workbook() -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet(ROSTER, roster_batch(&roster_rows()))
        .with_sheet(OUTCOMES, outcomes_batch(&outcome_rows()))
}
