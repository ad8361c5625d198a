//! Column names and the typed schema of the merged employee table.
//!
//! The merged table is checked once, right after the join, against
//! [`EMPLOYEE_COLUMNS`]. Everything downstream works on typed records.

use arrow::compute::can_cast_types;
use arrow::datatypes::{DataType, Schema};

use crate::error::{PrepError, Result};

pub mod date_utils;

/// Join key shared by both sheets
pub const EMPLOYEE_ID: &str = "employee_id";
/// Date the employee was hired
pub const HIRE_DATE: &str = "hire_date";
/// Age in years
pub const AGE: &str = "age";
/// Two-character job code, role letter followed by rank digit
pub const JOB_LEVEL: &str = "job_level";
/// Gender category
pub const GENDER: &str = "gender";
/// Performance rating text, leading digit is the rank
pub const PERF_RATING: &str = "perf_rating";
/// Promotion decision, non-null when a decision was recorded
pub const PROMO_DECISION: &str = "promo_decision";
/// Region descriptor
pub const REGION: &str = "region";
/// Job function descriptor
pub const JOB_FUNCTION: &str = "job_function";

/// Lowest valid performance rank
pub const PERF_RANK_MIN: u8 = 1;
/// Highest valid performance rank
pub const PERF_RANK_MAX: u8 = 5;

/// Logical kind of a column, independent of its physical Arrow type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Anything that can be rendered as text
    Text,
    /// Numeric value
    Number,
    /// Calendar date (date, timestamp or parseable text)
    Date,
}

impl ColumnKind {
    /// Whether an Arrow type can be read as this kind
    #[must_use]
    pub fn accepts(self, data_type: &DataType) -> bool {
        if matches!(data_type, DataType::Null) {
            return true;
        }
        match self {
            Self::Text => can_cast_types(data_type, &DataType::Utf8),
            Self::Number => data_type.is_numeric() || can_cast_types(data_type, &DataType::Float64),
            Self::Date => matches!(
                data_type,
                DataType::Date32
                    | DataType::Date64
                    | DataType::Timestamp(_, _)
                    | DataType::Utf8
                    | DataType::LargeUtf8
            ),
        }
    }

    /// Arrow type the column is normalized to before extraction
    #[must_use]
    pub fn target_type(self) -> DataType {
        match self {
            Self::Text => DataType::Utf8,
            Self::Number => DataType::Float64,
            Self::Date => DataType::Date32,
        }
    }
}

/// Expected column of the merged table
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// Column name
    pub name: &'static str,
    /// Logical kind
    pub kind: ColumnKind,
}

/// Columns the merged table must provide, besides the key
pub const EMPLOYEE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: HIRE_DATE, kind: ColumnKind::Date },
    ColumnSpec { name: AGE, kind: ColumnKind::Number },
    ColumnSpec { name: JOB_LEVEL, kind: ColumnKind::Text },
    ColumnSpec { name: GENDER, kind: ColumnKind::Text },
    ColumnSpec { name: PERF_RATING, kind: ColumnKind::Text },
    ColumnSpec { name: PROMO_DECISION, kind: ColumnKind::Text },
    ColumnSpec { name: REGION, kind: ColumnKind::Text },
    ColumnSpec { name: JOB_FUNCTION, kind: ColumnKind::Text },
];

/// Columns written by derivation; a source column of the same name is replaced
pub const DERIVED_COLUMNS: &[&str] = &["is_promo", "job_role", "job_rank", "is_men", "perf_rank", "tenure"];

/// Columns of the merged table carried through to the prepared table as text
///
/// Every column that is neither the key, an employee column nor a derived
/// column, in table order. Columns with no text rendering are skipped.
#[must_use]
pub fn passthrough_columns(schema: &Schema, key: &str) -> Vec<String> {
    schema
        .fields()
        .iter()
        .filter(|field| {
            let name = field.name().as_str();
            name != key
                && !EMPLOYEE_COLUMNS.iter().any(|column| column.name == name)
                && !DERIVED_COLUMNS.contains(&name)
        })
        .filter(|field| {
            let usable = can_cast_types(field.data_type(), &DataType::Utf8);
            if !usable {
                log::warn!("Skipping column '{}' of type {}", field.name(), field.data_type());
            }
            usable
        })
        .map(|field| field.name().clone())
        .collect()
}

/// A struct that represents the compatibility of a table with the expected columns
#[derive(Debug, Default)]
pub struct SchemaCompatibilityReport {
    /// Whether the table is usable
    pub compatible: bool,
    /// List of incompatibility issues, if any
    pub issues: Vec<SchemaIssue>,
}

/// A schema compatibility issue
#[derive(Debug, Clone)]
pub struct SchemaIssue {
    /// Where the table came from (sheet name or "merged")
    pub source: String,
    /// Column the issue concerns
    pub column: String,
    /// Description of the incompatibility
    pub description: String,
}

impl SchemaCompatibilityReport {
    /// Turn an incompatible report into a schema error listing every issue
    pub fn into_result(self) -> Result<()> {
        if self.compatible {
            return Ok(());
        }
        let details = self
            .issues
            .iter()
            .map(|issue| format!("{}.{}: {}", issue.source, issue.column, issue.description))
            .collect::<Vec<_>>()
            .join("; ");
        Err(PrepError::schema(details))
    }
}

/// Check a schema against a list of expected columns
#[must_use]
pub fn check_schema(schema: &Schema, expected: &[ColumnSpec], source: &str) -> SchemaCompatibilityReport {
    let mut report = SchemaCompatibilityReport {
        compatible: true,
        issues: Vec::new(),
    };

    for column in expected {
        let description = match schema.field_with_name(column.name) {
            Err(_) => Some("column is missing".to_string()),
            Ok(field) if !column.kind.accepts(field.data_type()) => Some(format!(
                "type {} cannot be read as {:?}",
                field.data_type(),
                column.kind
            )),
            Ok(_) => None,
        };

        if let Some(description) = description {
            report.compatible = false;
            report.issues.push(SchemaIssue {
                source: source.to_string(),
                column: column.name.to_string(),
                description,
            });
        }
    }

    report
}

/// Check that a sheet carries the join key
pub fn require_key_column(schema: &Schema, key: &str, sheet: &str) -> Result<()> {
    let field = schema
        .field_with_name(key)
        .map_err(|_| PrepError::schema(format!("join key '{key}' missing from sheet '{sheet}'")))?;

    if can_cast_types(field.data_type(), &DataType::Utf8) {
        Ok(())
    } else {
        Err(PrepError::schema(format!(
            "join key '{key}' in sheet '{sheet}' has unusable type {}",
            field.data_type()
        )))
    }
}
