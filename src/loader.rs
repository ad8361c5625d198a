//! Workbook loading: read the roster and outcomes sheets and join them.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::reader::WorkbookSource;
use crate::schema::require_key_column;
use crate::utils::arrow::{extract_keys, take_rows};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Suffix for roster columns whose name also appears in the outcomes sheet
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix for outcomes columns whose name also appears in the roster sheet
pub const RIGHT_SUFFIX: &str = "_y";

/// Result of joining the two sheets
///
/// `batch` holds one row per key; `keys[i]` is the key of row `i`. The
/// key column inside `batch` is normalized to text.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    /// Merged columns of both sheets
    pub batch: RecordBatch,
    /// Row keys, in row order
    pub keys: Vec<String>,
    /// Name of the key column
    pub key_column: String,
    /// Rows in the roster sheet before the join
    pub roster_rows: usize,
    /// Rows in the outcomes sheet before the join
    pub outcome_rows: usize,
}

impl JoinedTable {
    /// Number of joined rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.keys.len()
    }
}

/// Read both sheets from a workbook and join them on the configured key
pub fn load_workbook<W>(source: &mut W, config: &PipelineConfig) -> Result<JoinedTable>
where
    W: WorkbookSource + ?Sized,
{
    let start = Instant::now();
    let target = source.describe();
    log_operation_start("Loading", &target);

    let roster = source.require_sheet(&config.roster_sheet)?;
    let outcomes = source.require_sheet(&config.outcomes_sheet)?;
    log::debug!(
        "Read sheets '{}' ({} rows) and '{}' ({} rows)",
        config.roster_sheet,
        roster.num_rows(),
        config.outcomes_sheet,
        outcomes.num_rows()
    );

    let joined = join_sheets(
        &roster,
        &outcomes,
        &config.key_column,
        &config.roster_sheet,
        &config.outcomes_sheet,
    )?;

    log_operation_complete("joined", &target, joined.num_rows(), Some(start.elapsed()));
    Ok(joined)
}

/// Unique, non-null keys of one sheet
fn sheet_keys(batch: &RecordBatch, key: &str, sheet: &str) -> Result<Vec<String>> {
    require_key_column(&batch.schema(), key, sheet)?;

    let mut seen = FxHashMap::default();
    extract_keys(batch, key)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.ok_or_else(|| {
                PrepError::schema(format!("null '{key}' in sheet '{sheet}' at row {}", row + 1))
            })?;
            if let Some(first) = seen.insert(value.clone(), row) {
                return Err(PrepError::schema(format!(
                    "duplicate '{key}' {value} in sheet '{sheet}' (rows {} and {})",
                    first + 1,
                    row + 1
                )));
            }
            Ok(value)
        })
        .collect()
}

/// Inner join of two sheets on a key column
///
/// Rows keep the roster's order. Keys present in only one sheet are
/// dropped. Non-key columns present in both sheets get the `_x` / `_y`
/// suffixes.
pub fn join_sheets(
    roster: &RecordBatch,
    outcomes: &RecordBatch,
    key: &str,
    roster_name: &str,
    outcomes_name: &str,
) -> Result<JoinedTable> {
    let left_keys = sheet_keys(roster, key, roster_name)?;
    let right_keys = sheet_keys(outcomes, key, outcomes_name)?;

    let right_index: FxHashMap<&str, usize> = right_keys
        .iter()
        .enumerate()
        .map(|(row, value)| (value.as_str(), row))
        .collect();

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = left_keys
        .iter()
        .enumerate()
        .filter_map(|(row, value)| right_index.get(value.as_str()).map(|&other| (row, other)))
        .unzip();

    let keys: Vec<String> = left_rows.iter().map(|&row| left_keys[row].clone()).collect();
    let left = take_rows(roster, &left_rows)?;
    let right = take_rows(outcomes, &right_rows)?;

    let left_schema = left.schema();
    let right_schema = right.schema();
    let is_shared = |name: &str, other: &Schema| name != key && other.field_with_name(name).is_ok();

    let mut fields: Vec<Field> = Vec::with_capacity(left.num_columns() + right.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (field, column) in left_schema.fields().iter().zip(left.columns()) {
        if field.name() == key {
            fields.push(Field::new(key, DataType::Utf8, false));
            columns.push(Arc::new(StringArray::from_iter_values(keys.iter())));
        } else if is_shared(field.name(), &right_schema) {
            fields.push(field.as_ref().clone().with_name(format!("{}{LEFT_SUFFIX}", field.name())));
            columns.push(column.clone());
        } else {
            fields.push(field.as_ref().clone());
            columns.push(column.clone());
        }
    }

    for (field, column) in right_schema.fields().iter().zip(right.columns()) {
        if field.name() == key {
            continue;
        }
        if is_shared(field.name(), &left_schema) {
            fields.push(field.as_ref().clone().with_name(format!("{}{RIGHT_SUFFIX}", field.name())));
        } else {
            fields.push(field.as_ref().clone());
        }
        columns.push(column.clone());
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    log::info!(
        "Inner join on '{key}': {} roster rows, {} outcome rows, {} matched",
        roster.num_rows(),
        outcomes.num_rows(),
        keys.len()
    );

    Ok(JoinedTable {
        batch,
        keys,
        key_column: key.to_string(),
        roster_rows: roster.num_rows(),
        outcome_rows: outcomes.num_rows(),
    })
}
