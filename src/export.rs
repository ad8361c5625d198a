//! Output files: prepared and feature tables as Parquet, run report as JSON.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::features::FeatureTable;
use crate::models::PreparedRecord;
use crate::reader::parquet::write_batch;
use crate::utils::logging::log_operation_complete;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write the prepared table to a Parquet file
pub fn write_prepared(path: &Path, records: &[PreparedRecord]) -> Result<()> {
    ensure_parent(path)?;
    let batch = PreparedRecord::to_record_batch(records)?;
    write_batch(path, &batch)?;
    log_operation_complete("wrote", &path.display().to_string(), batch.num_rows(), None);
    Ok(())
}

/// Write a feature table to a Parquet file
pub fn write_features(path: &Path, table: &FeatureTable) -> Result<()> {
    ensure_parent(path)?;
    let batch = table.to_record_batch()?;
    write_batch(path, &batch)?;
    log_operation_complete("wrote", &path.display().to_string(), batch.num_rows(), None);
    Ok(())
}

/// Write any serializable value as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
