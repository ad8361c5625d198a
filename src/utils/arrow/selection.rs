//! Row selection on record batches.

use arrow::array::UInt32Array;
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;

use crate::error::{PrepError, Result};

/// Build a new batch holding the given rows, in the given order
pub fn take_rows(batch: &RecordBatch, rows: &[usize]) -> Result<RecordBatch> {
    let indices = rows
        .iter()
        .map(|&row| {
            u32::try_from(row)
                .map_err(|_| PrepError::schema(format!("row index {row} exceeds batch limits")))
        })
        .collect::<Result<Vec<u32>>>()?;

    Ok(take_record_batch(batch, &UInt32Array::from(indices))?)
}
