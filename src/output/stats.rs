//! Progress statistics from the on-disk state files
//!
//! This module reads the link list snapshot, the checkpoint store and the
//! failure log without touching the network, for the `--stats` mode.

use crate::config::OutputConfig;
use crate::storage::{load_snapshot, read_lines};
use crate::HarvestError;
use std::collections::HashSet;
use std::path::Path;

/// Progress of a harvest as recorded on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStatistics {
    /// Whether discovery has produced a link list yet
    pub snapshot_present: bool,

    /// Items in the link list
    pub total_items: u64,

    /// Link list items recorded in the checkpoint store
    pub completed: u64,

    /// Link list items not yet checkpointed
    pub remaining: u64,

    /// Lines in the failure log, duplicates included
    pub failure_records: u64,

    /// Link list items that are in the failure log and still not checkpointed
    pub failing_items: u64,
}

/// Loads statistics from the configured state files
pub fn load_statistics(output: &OutputConfig) -> Result<ProgressStatistics, HarvestError> {
    let snapshot = load_snapshot(Path::new(&output.link_list_path))?;
    let snapshot_present = snapshot.is_some();
    let items = snapshot.unwrap_or_default();

    let checkpointed = read_set(Path::new(&output.checkpoint_path))?;
    let failure_lines = read_all(Path::new(&output.failure_log_path))?;
    let failed: HashSet<&str> = failure_lines.iter().map(String::as_str).collect();

    let completed = items.iter().filter(|i| checkpointed.contains(*i)).count() as u64;
    let failing_items = items
        .iter()
        .filter(|i| !checkpointed.contains(*i) && failed.contains(i.as_str()))
        .count() as u64;
    let total_items = items.len() as u64;

    Ok(ProgressStatistics {
        snapshot_present,
        total_items,
        completed,
        remaining: total_items - completed,
        failure_records: failure_lines.len() as u64,
        failing_items,
    })
}

fn read_set(path: &Path) -> Result<HashSet<String>, HarvestError> {
    Ok(read_all(path)?.into_iter().collect())
}

/// Reads a state file without opening it for writing; a missing file is empty
fn read_all(path: &Path) -> Result<Vec<String>, HarvestError> {
    Ok(read_lines(path)?)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ProgressStatistics) {
    println!("=== Harvest Statistics ===\n");

    if !stats.snapshot_present {
        println!("No link list yet: discovery has not completed.");
        println!();
    }

    println!("Items:");
    println!("  In link list: {}", stats.total_items);
    println!("  Completed: {}", stats.completed);
    println!("  Remaining: {}", stats.remaining);
    println!("  Remaining with recorded failures: {}", stats.failing_items);
    println!();

    println!("Failure log lines: {}", stats.failure_records);

    let completion = if stats.total_items > 0 {
        (stats.completed as f64 / stats.total_items as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Completion: {:.1}% ({} / {} items)",
        completion, stats.completed, stats.total_items
    );
}
