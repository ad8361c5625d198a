//! Employee records before and after derivation
//!
//! [`EmployeeRecord`] holds the raw merged values as loaded, with the
//! coded fields still in text form. [`PreparedRecord`] is the
//! analysis-ready row produced by the deriver.

pub mod employee;
pub mod prepared;
pub mod types;

pub use employee::EmployeeRecord;
pub use prepared::{PreparedRecord, RecordFingerprint};
pub use types::{CodeParseError, JobLevel, PerfRank};
