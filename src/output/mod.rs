//! Output module for run summaries and reports
//!
//! This module handles:
//! - The end-of-run summary (totals attempted, completed and failed)
//! - Progress statistics read back from the state files

pub mod stats;

pub use stats::{load_statistics, print_statistics, ProgressStatistics};

use crate::config::OutputConfig;

/// Totals for one orchestrator run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items in the link list
    pub total: usize,

    /// Items skipped because the checkpoint store already had them
    pub skipped: usize,

    /// Items processed in this run
    pub attempted: usize,

    /// Items whose resource was transferred in this run
    pub downloaded: usize,

    /// Items whose destination file already existed
    pub already_present: usize,

    /// Items recorded to the failure log in this run
    pub failed: usize,

    /// The run stopped early on an interrupt
    pub interrupted: bool,
}

impl RunSummary {
    /// Items checkpointed in this run
    pub fn completed(&self) -> usize {
        self.downloaded + self.already_present
    }

    /// Items neither skipped nor attempted (left over by an interrupt)
    pub fn unprocessed(&self) -> usize {
        self.total
            .saturating_sub(self.skipped)
            .saturating_sub(self.attempted)
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(summary: &RunSummary, output: &OutputConfig) {
    println!();
    println!("{}", "=".repeat(50));
    if summary.interrupted {
        println!("Run interrupted; progress so far has been recorded.");
    } else {
        println!("All items processed.");
    }
    println!(
        "  Items: {} total, {} skipped from checkpoint",
        summary.total, summary.skipped
    );
    println!(
        "  Attempted: {}  Completed: {} ({} downloaded, {} already present)  Failed: {}",
        summary.attempted,
        summary.completed(),
        summary.downloaded,
        summary.already_present,
        summary.failed
    );
    if summary.interrupted {
        println!("  Not yet processed: {}", summary.unprocessed());
    }
    println!("  Downloads: {}", output.download_dir);
    println!("  Failed items: {}", output.failure_log_path);
    println!("  Progress: {}", output.checkpoint_path);
    println!("{}", "=".repeat(50));
}
