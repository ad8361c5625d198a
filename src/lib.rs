//! Data preparation for employee performance and promotion analysis.
//!
//! Reads a roster sheet and a mid-year outcomes sheet, joins them on the
//! employee id, cleans and derives analysis fields, applies eligibility
//! rules and hands the prepared table to the analysis and feature-table
//! consumers.

pub mod analysis;
pub mod clean;
pub mod config;
pub mod derive;
pub mod eligibility;
pub mod error;
pub mod export;
pub mod features;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod utils;

// Core types
pub use config::{ParseMode, PipelineConfig};
pub use error::{PrepError, Result};
pub use models::{EmployeeRecord, PreparedRecord};
pub use pipeline::{PipelineOutput, RunReport, run_pipeline};

// Workbook sources
pub use reader::{MemoryWorkbook, ParquetWorkbook, WorkbookSource, XlsxWorkbook};

// Arrow types
pub use arrow::record_batch::RecordBatch;
