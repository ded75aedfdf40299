//! Crawler module for catalog page fetching and discovery
//!
//! This module contains the page-level plumbing shared by discovery and
//! resolution, including:
//! - HTTP fetching with a shared politeness pacer
//! - Selector-driven HTML extraction
//! - Breadth-first pagination crawling

mod catalog;
mod fetcher;
mod parser;

pub use catalog::{CatalogCrawler, ItemFilter};
pub use fetcher::{build_http_client, resolve_encoding, FetchedPage, PageFetcher, Pacer};
pub use parser::{
    extract_listing, first_link, first_text, select_links, CatalogSelectors, ListingLinks,
};

pub(crate) use fetcher::describe_error;
