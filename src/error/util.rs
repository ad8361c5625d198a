//! Utility functions for error handling
//!
//! Path checks that turn a bare `io::Error` into one naming the path and
//! the purpose it was needed for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PrepError, Result};

fn io_error(kind: io::ErrorKind, message: String) -> PrepError {
    PrepError::IoError(io::Error::new(kind, message))
}

/// Check that a path exists and is a regular file
///
/// # Arguments
/// * `path` - The path to check
/// * `purpose` - Why the file is needed (for error context)
pub fn ensure_file(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(io_error(
            io::ErrorKind::NotFound,
            format!("File not found: {} (needed for: {purpose})", path.display()),
        ));
    }

    if !path.is_file() {
        return Err(io_error(
            io::ErrorKind::InvalidInput,
            format!("Path is not a file: {} (expected a file for: {purpose})", path.display()),
        ));
    }

    Ok(())
}

/// Safely open a file with rich error information
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    ensure_file(path, purpose)?;

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions",
            _ => "Failed to open file",
        };
        io_error(e.kind(), format!("{context}: {} ({purpose}): {e}", path.display()))
    })
}

/// Check if a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(io_error(
            io::ErrorKind::NotFound,
            format!("Directory not found: {} (needed for: {purpose})", path.display()),
        ));
    }

    if !path.is_dir() {
        return Err(io_error(
            io::ErrorKind::InvalidInput,
            format!("Path is not a directory: {} (expected a directory for: {purpose})", path.display()),
        ));
    }

    fs::read_dir(path).map(|_| ()).map_err(|e| {
        io_error(
            e.kind(),
            format!("Failed to access directory {} ({purpose}): {e}", path.display()),
        )
    })
}
