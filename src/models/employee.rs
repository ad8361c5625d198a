//! Employee record as loaded from the merged sheets.

use std::collections::BTreeMap;

use itertools::izip;

use crate::error::Result;
use crate::loader::JoinedTable;
use crate::schema::date_utils::DateFormatConfig;
use crate::schema::{
    AGE, EMPLOYEE_COLUMNS, GENDER, HIRE_DATE, JOB_FUNCTION, JOB_LEVEL, PERF_RATING, PROMO_DECISION,
    REGION, check_schema, passthrough_columns,
};
use crate::utils::arrow::{DateCell, extract_dates, extract_f64s, extract_strings};

/// One row of the merged roster and outcomes sheets, with raw values
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    /// Unique key
    pub employee_id: String,
    /// Hire date as read from the source
    pub hire_date: DateCell,
    /// Age in years
    pub age: Option<f64>,
    /// Job level code, e.g. `M3`
    pub job_level: Option<String>,
    /// Gender category
    pub gender: Option<String>,
    /// Performance rating text, e.g. `3 - Meets`
    pub perf_rating: Option<String>,
    /// Promotion decision, if one was recorded
    pub promo_decision: Option<String>,
    /// Region descriptor
    pub region: Option<String>,
    /// Job function descriptor
    pub job_function: Option<String>,
    /// Any other columns of the merged table, as text, keyed by column name
    pub extra: BTreeMap<String, Option<String>>,
}

impl EmployeeRecord {
    /// Create a record with only a key; every other field is missing
    #[must_use]
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            hire_date: DateCell::Missing,
            age: None,
            job_level: None,
            gender: None,
            perf_rating: None,
            promo_decision: None,
            region: None,
            job_function: None,
            extra: BTreeMap::new(),
        }
    }

    /// Validate the merged table against the employee schema and extract typed records
    ///
    /// This is the single point where the untyped table is checked; every
    /// later stage works on the returned records.
    pub fn from_joined(table: &JoinedTable, date_config: &DateFormatConfig) -> Result<Vec<Self>> {
        let batch = &table.batch;
        check_schema(&batch.schema(), EMPLOYEE_COLUMNS, "merged").into_result()?;

        let hire_dates = extract_dates(batch, HIRE_DATE, date_config)?;
        let ages = extract_f64s(batch, AGE)?;
        let job_levels = extract_strings(batch, JOB_LEVEL)?;
        let genders = extract_strings(batch, GENDER)?;
        let perf_ratings = extract_strings(batch, PERF_RATING)?;
        let promo_decisions = extract_strings(batch, PROMO_DECISION)?;
        let regions = extract_strings(batch, REGION)?;
        let job_functions = extract_strings(batch, JOB_FUNCTION)?;

        let passthrough = passthrough_columns(&batch.schema(), &table.key_column)
            .into_iter()
            .map(|name| {
                let values = extract_strings(batch, &name)?;
                Ok((name, values))
            })
            .collect::<Result<Vec<_>>>()?;
        if !passthrough.is_empty() {
            let names: Vec<&str> = passthrough.iter().map(|(name, _)| name.as_str()).collect();
            log::debug!("Carrying through columns: {}", names.join(", "));
        }

        let records = izip!(
            &table.keys,
            hire_dates,
            ages,
            job_levels,
            genders,
            perf_ratings,
            promo_decisions,
            regions,
            job_functions
        )
        .enumerate()
        .map(
            |(row, (employee_id, hire_date, age, job_level, gender, perf_rating, promo_decision, region, job_function))| {
                let extra = passthrough
                    .iter()
                    .map(|(name, values)| (name.clone(), values[row].clone()))
                    .collect();
                Self {
                    employee_id: employee_id.clone(),
                    hire_date,
                    age,
                    job_level,
                    gender,
                    perf_rating,
                    promo_decision,
                    region,
                    job_function,
                    extra,
                }
            },
        )
        .collect();

        Ok(records)
    }
}
