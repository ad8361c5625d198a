//! Descriptive analysis and significance tests on the prepared table.
//!
//! These functions only read the prepared records; nothing here writes
//! back to the table.

pub mod significance;
pub mod summary;

pub use significance::{ALPHA, TestOutcome, performance_ttest, promotion_chi_square};
pub use summary::{
    Crosstab, DescriptiveStats, Dimension, GroupRate, GroupStats, Measure, crosstab, describe_by,
    group_rates, promotion_rate,
};
