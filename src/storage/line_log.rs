//! Append-only record files backing the checkpoint store and the failure log

use crate::storage::{StorageError, StorageResult};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Append-only newline-delimited record file
///
/// Appends are serialized through an internal mutex and each record is
/// written with a single `write_all`, then flushed and synced before
/// `append` returns. Readers treat the file as a set: blank lines are
/// skipped and duplicates collapse.
#[derive(Debug)]
pub struct LineLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl LineLog {
    /// Opens (creating if needed) the log at `path`
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record, in file order, including duplicates
    pub fn read_lines(&self) -> StorageResult<Vec<String>> {
        read_lines(&self.path)
    }

    /// Reads the set of distinct records
    pub fn load(&self) -> StorageResult<HashSet<String>> {
        Ok(self.read_lines()?.into_iter().collect())
    }

    /// Appends one record and makes it durable
    ///
    /// # Errors
    ///
    /// * `StorageError::InvalidRecord` - the record is empty or spans lines
    /// * `StorageError::Write` - the write, flush or sync failed
    pub fn append(&self, record: &str) -> StorageResult<()> {
        let record = record.trim();
        if record.is_empty() || record.contains(['\n', '\r']) {
            return Err(StorageError::InvalidRecord(record.to_string()));
        }

        let line = format!("{}\n", record);
        let mut file = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_data())
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

/// Reads the trimmed non-empty lines of a text file; a missing file reads as empty
pub(crate) fn read_lines(path: &Path) -> StorageResult<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
