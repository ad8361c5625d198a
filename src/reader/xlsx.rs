//! Spreadsheet workbooks (xlsx, xlsm, xls, ods) read with `calamine`.
//!
//! Each worksheet's used range becomes one record batch. The first row
//! holds the column names; column types are inferred from the cells.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Date32Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
    new_null_array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use calamine::{Data, DataType as _, Range, Reader, Sheets, open_workbook_auto};
use chrono::NaiveTime;
use log::debug;

use crate::error::Result;
use crate::error::util::ensure_file;
use crate::reader::WorkbookSource;
use crate::utils::arrow::extractors::date_to_days;

/// A spreadsheet file opened for reading
pub struct XlsxWorkbook {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl std::fmt::Debug for XlsxWorkbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxWorkbook").field("path", &self.path).finish_non_exhaustive()
    }
}

impl XlsxWorkbook {
    /// Open a spreadsheet file; the format is chosen from its extension
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_file(path, "spreadsheet workbook")?;
        let workbook = open_workbook_auto(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl WorkbookSource for XlsxWorkbook {
    fn describe(&self) -> String {
        format!("spreadsheet {}", self.path.display())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RecordBatch> {
        let range = self.workbook.worksheet_range(name)?;
        range_to_batch(&range)
    }
}

static EMPTY_CELL: Data = Data::Empty;

/// Column type inferred from the non-empty cells of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Empty,
    Integer,
    Float,
    Date,
    Text,
}

impl Inferred {
    fn of(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::Int(_) => Self::Integer,
            Data::Float(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => Self::Integer,
            Data::Float(_) => Self::Float,
            Data::DateTime(_) | Data::DateTimeIso(_) => Self::Date,
            Data::String(text) if text.is_empty() => Self::Empty,
            Data::String(_) | Data::Bool(_) | Data::DurationIso(_) => Self::Text,
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, Self::Empty) => a,
            (Self::Empty, b) => b,
            (a, b) if a == b => a,
            (Self::Integer | Self::Float, Self::Integer | Self::Float) => Self::Float,
            _ => Self::Text,
        }
    }
}

/// Convert a worksheet range into a record batch
///
/// Header cells that are empty become `Unnamed: <index>`; repeated headers
/// get a `.1`, `.2`, ... suffix.
pub fn range_to_batch(range: &Range<Data>) -> Result<RecordBatch> {
    let mut rows = range.rows();
    let header_row = rows.next().unwrap_or(&[]);
    let data_rows: Vec<&[Data]> = rows.collect();
    let headers = column_names(header_row);

    let mut fields = Vec::with_capacity(headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());

    for (idx, name) in headers.into_iter().enumerate() {
        let cells: Vec<&Data> = data_rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
            .collect();
        let kind = cells
            .iter()
            .fold(Inferred::Empty, |acc, cell| acc.merge(Inferred::of(cell)));
        debug!("Column '{name}' inferred as {kind:?}");

        let array = build_column(&cells, kind);
        fields.push(Field::new(name, array.data_type().clone(), true));
        columns.push(array);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(data_rows.len()));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &options,
    )?)
}

fn column_names(header_row: &[Data]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header_row.len());
    for (idx, cell) in header_row.iter().enumerate() {
        let base = match cell_text(cell) {
            Some(text) => text,
            None => format!("Unnamed: {idx}"),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn build_column(cells: &[&Data], kind: Inferred) -> ArrayRef {
    match kind {
        Inferred::Empty => new_null_array(&DataType::Utf8, cells.len()),
        Inferred::Integer => Arc::new(Int64Array::from_iter(cells.iter().map(|cell| match cell {
            Data::Int(value) => Some(*value),
            #[allow(clippy::cast_possible_truncation)]
            Data::Float(value) => Some(*value as i64),
            _ => None,
        }))),
        Inferred::Float => Arc::new(Float64Array::from_iter(cells.iter().map(|cell| cell.as_f64()))),
        Inferred::Date => {
            let has_time = cells
                .iter()
                .filter_map(|cell| cell.as_datetime())
                .any(|datetime| datetime.time() != NaiveTime::MIN);
            if has_time {
                Arc::new(TimestampMicrosecondArray::from_iter(cells.iter().map(|cell| {
                    cell.as_datetime()
                        .map(|datetime| datetime.and_utc().timestamp_micros())
                })))
            } else {
                Arc::new(Date32Array::from_iter(
                    cells.iter().map(|cell| cell.as_date().map(date_to_days)),
                ))
            }
        }
        Inferred::Text => Arc::new(StringArray::from_iter(cells.iter().copied().map(cell_text))),
    }
}

/// Render a cell as text the way it reads in the sheet
///
/// Strings are kept verbatim; only an empty string counts as an empty cell.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(text.clone()),
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => Some(format!("{value:.0}")),
        Data::Float(value) => Some(value.to_string()),
        Data::Bool(value) => Some(value.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell.as_date().map(|date| date.to_string()),
        Data::DurationIso(text) => Some(text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut range = Range::new((0, 0), (height as u32 - 1, width as u32 - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn infers_column_types() {
        let range = sheet(vec![
            vec![s("employee_id"), s("age"), s("job_level"), s("note")],
            vec![Data::Float(1001.0), Data::Float(34.56), s("M3"), Data::Empty],
            vec![Data::Int(1002), Data::Int(40), s("P2"), Data::Empty],
        ]);
        let batch = range_to_batch(&range).unwrap();

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(3).null_count(), 2);
    }

    #[test]
    fn mixed_columns_become_text() {
        let range = sheet(vec![
            vec![s("perf_rating")],
            vec![Data::Int(3)],
            vec![s("4 - Exceeds")],
        ]);
        let batch = range_to_batch(&range).unwrap();
        let values = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(values.value(0), "3");
        assert_eq!(values.value(1), "4 - Exceeds");
    }

    #[test]
    fn text_cells_keep_their_whitespace() {
        let range = sheet(vec![
            vec![s("gender"), s("promo_decision")],
            vec![s(" men"), s(" ")],
            vec![s("men"), s("")],
        ]);
        let batch = range_to_batch(&range).unwrap();
        let genders = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(genders.value(0), " men");
        assert_eq!(genders.value(1), "men");
        let decisions = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(decisions.value(0), " ");
        assert!(decisions.is_null(1));
    }

    #[test]
    fn date_columns_with_times_become_timestamps() {
        // 2022-03-30 is serial 44650 in the 1900 date system
        let stamp = |serial: f64| Data::DateTime(calamine::ExcelDateTime::new(
            serial,
            calamine::ExcelDateTimeType::DateTime,
            false,
        ));
        let range = sheet(vec![
            vec![s("plain"), s("timed")],
            vec![stamp(44650.0), stamp(44650.5)],
        ]);
        let batch = range_to_batch(&range).unwrap();
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Date32);
        assert!(matches!(schema.field(1).data_type(), DataType::Timestamp(_, None)));
    }

    #[test]
    fn repeated_and_empty_headers_are_renamed() {
        assert_eq!(
            column_names(&[s("a"), Data::Empty, s("a")]),
            vec!["a".to_string(), "Unnamed: 1".to_string(), "a.1".to_string()]
        );
    }
}
