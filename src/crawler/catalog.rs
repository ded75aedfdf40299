//! Breadth-first discovery of item references across paginated listings

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{extract_listing, CatalogSelectors};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Predicate deciding whether an item link found on a listing page is kept
pub type ItemFilter = Box<dyn Fn(&Url) -> bool + Send + Sync>;

/// Walks listing pages and collects item references
///
/// The visited-page set is shared by all roots of one [`discover`] call, so a
/// listing reachable from two roots (or through a pagination cycle) is
/// fetched exactly once and the crawl always terminates.
///
/// [`discover`]: CatalogCrawler::discover
pub struct CatalogCrawler<'a> {
    fetcher: &'a PageFetcher,
    selectors: &'a CatalogSelectors,
    include: ItemFilter,
}

impl<'a> CatalogCrawler<'a> {
    /// Creates a crawler that keeps every item link the item selector matches
    pub fn new(fetcher: &'a PageFetcher, selectors: &'a CatalogSelectors) -> Self {
        Self {
            fetcher,
            selectors,
            include: Box::new(|_| true),
        }
    }

    /// Replaces the item inclusion predicate
    pub fn with_item_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.include = Box::new(filter);
        self
    }

    /// Keeps only item links whose address contains every given fragment
    pub fn with_href_fragments(self, fragments: Vec<String>) -> Self {
        self.with_item_filter(move |url| {
            fragments
                .iter()
                .all(|fragment| url.as_str().contains(fragment.as_str()))
        })
    }

    /// Crawls every root and returns the item references found
    ///
    /// References are unique and in discovery order. Pages that fail to load
    /// are logged and dropped; discovery continues with the rest of the queue.
    pub async fn discover(&self, roots: &[Url]) -> Vec<String> {
        let mut visited_pages: HashSet<String> = HashSet::new();
        let mut seen_items: HashSet<String> = HashSet::new();
        let mut items: Vec<String> = Vec::new();

        for root in roots {
            tracing::info!("Discovering items from catalog root {}", root);
            let found_before = items.len();

            let mut start = root.clone();
            start.set_fragment(None);
            let mut queue = VecDeque::from([start]);

            while let Some(page_url) = queue.pop_front() {
                if !visited_pages.insert(page_url.to_string()) {
                    continue;
                }

                tracing::info!("  -> Listing page {}", page_url);
                let page = match self.fetcher.fetch(&page_url).await {
                    Ok(page) => page,
                    Err(e) => {
                        tracing::warn!("Dropping listing page: {}", e);
                        continue;
                    }
                };

                // A redirect may land on a listing we already walked
                visited_pages.insert(page.url.to_string());

                let links = extract_listing(&page.body, &page.url, self.selectors);

                for item in links.items {
                    if !(self.include)(&item) {
                        continue;
                    }
                    let reference = item.to_string();
                    if seen_items.insert(reference.clone()) {
                        items.push(reference);
                    }
                }

                for next in links.pages {
                    if !visited_pages.contains(next.as_str()) {
                        queue.push_back(next);
                    }
                }
            }

            tracing::info!(
                "Catalog root {} done: {} new unique items",
                root,
                items.len() - found_before
            );
        }

        items
    }
}
