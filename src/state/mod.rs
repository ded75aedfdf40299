//! State module for tracking run progress
//!
//! # Components
//!
//! - `ItemState`: Tracks the state of an individual item (pending, resolving, retrieving, completed, failed)

mod item_state;

// Re-export main types
pub use item_state::ItemState;
