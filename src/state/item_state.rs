//! Item state definitions for tracking one item through a run
//!
//! This module defines every state an item can be in while the orchestrator
//! processes it, and which transitions between them are legal.

use crate::HarvestError;
use std::fmt;

/// Represents the current state of an item during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Item is waiting to be processed
    Pending,

    /// Item is going through the resolution pipeline
    Resolving,

    /// Item's resource is being transferred
    Retrieving,

    // ===== Terminal States =====
    /// Resource is on disk and the item is checkpointed
    Completed,

    /// Some stage failed and the item is in the failure log
    Failed,
}

impl ItemState {
    /// Returns true if no further processing happens in this run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the given state may follow this one
    ///
    /// ```text
    /// Pending -> Resolving -> Retrieving -> Completed
    ///               |             |
    ///               +-> Failed <--+
    /// ```
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Resolving)
                | (Self::Resolving, Self::Retrieving)
                | (Self::Resolving, Self::Failed)
                | (Self::Retrieving, Self::Completed)
                | (Self::Retrieving, Self::Failed)
        )
    }

    /// Moves to the next state, rejecting illegal transitions
    pub fn transition(self, next: ItemState) -> Result<ItemState, HarvestError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Retrieving => "retrieving",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
