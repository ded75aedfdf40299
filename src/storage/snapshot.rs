//! The link list: every item reference discovery found, written once

use crate::storage::line_log::read_lines;
use crate::storage::{StorageError, StorageResult};
use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Loads the link list snapshot
///
/// # Returns
///
/// * `Ok(Some(items))` - The snapshot exists; unique items in file order
/// * `Ok(None)` - No snapshot yet, discovery has to run
///
/// A hand-edited list may repeat a line; only its first occurrence is kept.
pub fn load_snapshot(path: &Path) -> StorageResult<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut seen = HashSet::new();
    let items = read_lines(path)?
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect();
    Ok(Some(items))
}

/// Deduplicates and sorts discovered item references
pub fn build_snapshot<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    items
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Writes the snapshot atomically
///
/// The list is written to a sibling temporary file which is then renamed over
/// `path`, so a crash never leaves a half-written snapshot that a later run
/// would mistake for a complete one.
pub fn write_snapshot(path: &Path, items: &[String]) -> StorageResult<()> {
    let write_error = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut content = String::with_capacity(items.iter().map(|i| i.len() + 1).sum());
    for item in items {
        content.push_str(item);
        content.push('\n');
    }

    let result = std::fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| std::fs::rename(&tmp_path, path));

    if let Err(source) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_error(source));
    }

    Ok(())
}
