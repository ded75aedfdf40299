//! Catalog-Harvest: a resumable catalog downloader
//!
//! This crate crawls paginated catalog listings, resolves each listed item through
//! a fixed chain of landing pages to its final download address, and stores the
//! resource on disk. Progress is checkpointed to append-only text files so an
//! interrupted run can pick up where it stopped.

pub mod config;
pub mod crawler;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod retriever;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for fatal Catalog-Harvest failures
///
/// Per-page and per-item failures are reported through [`PageError`],
/// [`pipeline::ResolutionFailure`] and [`retriever::TransferError`] instead and
/// never abort a run on their own.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ItemState,
        to: state::ItemState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to obtain or interpret a single HTML page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Transport failure or non-success status
    #[error("Page unreachable {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The page was fetched but the expected element was not there
    #[error("No {element} found on {url}")]
    ExtractionMissing { url: String, element: &'static str },
}

impl PageError {
    /// Returns true if this error came from the network rather than the markup
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use orchestrator::{Orchestrator, RunSummary};
pub use pipeline::{ResolutionFailure, ResolvedResource, Stage};
pub use retriever::{sanitize_filename, RetrievalOutcome};
pub use state::ItemState;
