//! Pipeline stages, the resolution state machine and its failure type

use crate::PageError;
use std::fmt;
use thiserror::Error;
use url::Url;

/// A network-bound step of the resolution pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Item page: title and download entry link
    Intro,
    /// Download info page: trigger link
    Info,
    /// Download trigger page: final resource address
    Trigger,
}

impl Stage {
    /// Steps an item goes through: the three stages plus the handoff to retrieval
    pub const STEPS: u8 = 4;

    /// 1-based position of the stage among the four pipeline steps
    pub fn position(&self) -> u8 {
        match self {
            Self::Intro => 1,
            Self::Info => 2,
            Self::Trigger => 3,
        }
    }

    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Info => "info",
            Self::Trigger => "trigger",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a successful resolution, handed to the retriever
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// The item reference this resource was resolved from
    pub item: String,

    /// Final retrievable address
    pub resource_url: Url,

    /// Title used to name the stored file
    pub display_name: String,
}

/// Progress of one item through the pipeline
///
/// Each variant carries exactly what the next stage needs; the display name
/// is picked up by the intro stage and carried forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Intro {
        item: String,
    },
    Info {
        item: String,
        entry: Url,
        display_name: String,
    },
    Trigger {
        item: String,
        trigger: Url,
        display_name: String,
    },
    Resolved(ResolvedResource),
}

impl ResolutionState {
    /// Starts the pipeline for an item
    pub fn start(item: impl Into<String>) -> Self {
        Self::Intro { item: item.into() }
    }
}

/// A resolution attempt that stopped at a specific stage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} stage failed: {error}")]
pub struct ResolutionFailure {
    pub stage: Stage,
    #[source]
    pub error: PageError,
}

impl ResolutionFailure {
    pub fn new(stage: Stage, error: PageError) -> Self {
        Self { stage, error }
    }
}
