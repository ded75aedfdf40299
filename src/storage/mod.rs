//! Storage module for persisting run progress
//!
//! This module handles all durable state of a harvest, including:
//! - Append-only line logs (the checkpoint store and the failure log)
//! - The one-time link list snapshot produced by discovery
//!
//! Everything is plain newline-delimited UTF-8 text so the files stay
//! readable and editable by hand between runs.

mod line_log;
mod snapshot;

pub use line_log::LineLog;
pub(crate) use line_log::read_lines;
pub use snapshot::{build_snapshot, load_snapshot, write_snapshot};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Any of these threatens the resumability of a run and is treated as fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record must be a single non-empty line: {0:?}")]
    InvalidRecord(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
