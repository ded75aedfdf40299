//! URL handling module for Catalog-Harvest
//!
//! This module resolves hrefs found in catalog markup into absolute addresses
//! and derives file extensions from resource addresses.

mod normalize;

// Re-export main functions
pub use normalize::{file_extension, resolve_link};
