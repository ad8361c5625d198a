//! Arrow data handling utilities
//!
//! Helpers for pulling typed columns out of record batches and for
//! reassembling batches after row selection.

pub mod array_utils;
pub mod extractors;
pub mod selection;

pub use array_utils::{downcast_array, get_column};
pub use extractors::{DateCell, extract_dates, extract_f64s, extract_keys, extract_strings};
pub use selection::take_rows;
