//! Workbook sources.
//!
//! A workbook is a set of named sheets, each read as one Arrow
//! [`RecordBatch`]. The loader only sees the [`WorkbookSource`] trait, so
//! spreadsheets, Parquet directories and in-memory tables are
//! interchangeable.

use arrow::record_batch::RecordBatch;

use crate::error::{PrepError, Result};

pub mod parquet;
pub mod xlsx;

pub use self::parquet::ParquetWorkbook;
pub use self::xlsx::XlsxWorkbook;

/// A source of named sheets
pub trait WorkbookSource {
    /// Human readable description, used in log messages
    fn describe(&self) -> String;

    /// Names of the sheets the workbook contains
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet into a single record batch
    ///
    /// Implementations may assume the sheet exists; callers go through
    /// [`WorkbookSource::require_sheet`].
    fn read_sheet(&mut self, name: &str) -> Result<RecordBatch>;

    /// Read a sheet, failing with [`PrepError::MissingSheet`] if it is absent
    fn require_sheet(&mut self, name: &str) -> Result<RecordBatch> {
        let available = self.sheet_names();
        if !available.iter().any(|sheet| sheet == name) {
            return Err(PrepError::MissingSheet {
                sheet: name.to_string(),
                available,
            });
        }
        self.read_sheet(name)
    }
}

/// Sheets held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, RecordBatch)>,
}

impl MemoryWorkbook {
    /// Creates an empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sheet
    #[must_use]
    pub fn with_sheet(mut self, name: impl Into<String>, batch: RecordBatch) -> Self {
        let name = name.into();
        self.sheets.retain(|(existing, _)| *existing != name);
        self.sheets.push((name, batch));
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn describe(&self) -> String {
        format!("in-memory workbook ({} sheets)", self.sheets.len())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<RecordBatch> {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, batch)| batch.clone())
            .ok_or_else(|| PrepError::MissingSheet {
                sheet: name.to_string(),
                available: self.sheet_names(),
            })
    }
}
