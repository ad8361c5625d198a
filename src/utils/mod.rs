//! Utility functions shared by the pipeline stages

pub mod arrow;
pub mod logging;
