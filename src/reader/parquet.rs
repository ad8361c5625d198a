//! Parquet-backed workbooks: one `<sheet name>.parquet` file per sheet.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::Result;
use crate::error::util::{safe_open_file, validate_directory};
use crate::reader::WorkbookSource;

/// File extension of sheet files
pub const SHEET_EXTENSION: &str = "parquet";

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// A directory of Parquet files, one per sheet
#[derive(Debug, Clone)]
pub struct ParquetWorkbook {
    dir: PathBuf,
}

impl ParquetWorkbook {
    /// Open a directory as a workbook
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        validate_directory(dir, "parquet workbook")?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Path of the file backing a sheet
    #[must_use]
    pub fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SHEET_EXTENSION}"))
    }

    /// Write a batch as a sheet of this workbook, replacing any existing one
    pub fn write_sheet(&self, name: &str, batch: &RecordBatch) -> Result<PathBuf> {
        let path = self.sheet_path(name);
        write_batch(&path, batch)?;
        Ok(path)
    }
}

impl WorkbookSource for ParquetWorkbook {
    fn describe(&self) -> String {
        format!("parquet workbook {}", self.dir.display())
    }

    fn sheet_names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SHEET_EXTENSION))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    fn read_sheet(&mut self, name: &str) -> Result<RecordBatch> {
        read_batch(&self.sheet_path(name))
    }
}

/// Read a whole Parquet file into a single record batch
pub fn read_batch(path: &Path) -> Result<RecordBatch> {
    let file = safe_open_file(path, "parquet sheet")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(DEFAULT_BATCH_SIZE);
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(concat_batches(&schema, &batches)?)
}

/// Write a record batch to a Parquet file
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sheet() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("employee_id", DataType::Int64, false),
            Field::new("region", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("North"), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn sheets_round_trip_through_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = ParquetWorkbook::open(dir.path()).unwrap();
        workbook.write_sheet("Employee Roster", &sheet()).unwrap();

        assert_eq!(workbook.sheet_names(), vec!["Employee Roster".to_string()]);
        let batch = workbook.require_sheet("Employee Roster").unwrap();
        assert_eq!(batch.num_rows(), 2);
        let regions = batch
            .column_by_name("region")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(regions.value(0), "North");
        assert!(regions.is_null(1));
    }

    #[test]
    fn missing_directory_fails() {
        assert!(matches!(
            ParquetWorkbook::open("/no/such/workbook"),
            Err(PrepError::IoError(_))
        ));
    }
}
