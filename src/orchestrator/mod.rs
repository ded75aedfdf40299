//! Orchestrator module
//!
//! Drives a whole harvest run: link list, per-item resolution and
//! retrieval, and the checkpoint/failure bookkeeping that makes runs
//! resumable.

mod coordinator;

pub use crate::output::RunSummary;
pub use coordinator::Orchestrator;
