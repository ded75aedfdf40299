//! HTML parser for extracting catalog links and item metadata
//!
//! All markup rules are CSS selectors taken from the catalog configuration,
//! compiled once into [`CatalogSelectors`]. Parsing is synchronous; callers
//! keep the parsed document out of any `.await` so their futures stay `Send`.

use crate::config::CatalogConfig;
use crate::url::resolve_link;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled markup rules for one catalog site
#[derive(Debug, Clone)]
pub struct CatalogSelectors {
    /// Item anchors on a listing page
    pub item: Selector,
    /// Pagination anchors on a listing page
    pub pagination: Selector,
    /// Title element on an intro page
    pub title: Selector,
    /// Download entry anchor on an intro page
    pub entry: Selector,
    /// Trigger anchor on a download info page
    pub trigger: Selector,
    /// Final resource anchor on a trigger page
    pub resource: Selector,
}

impl CatalogSelectors {
    /// Compiles every selector of the catalog configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CatalogSelectors)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - The first selector that failed, by name
    pub fn compile(config: &CatalogConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile_selector("item_selector", &config.item_selector)?,
            pagination: compile_selector("pagination_selector", &config.pagination_selector)?,
            title: compile_selector("title_selector", &config.title_selector)?,
            entry: compile_selector("entry_selector", &config.entry_selector)?,
            trigger: compile_selector("trigger_selector", &config.trigger_selector)?,
            resource: compile_selector("resource_selector", &config.resource_selector)?,
        })
    }
}

fn compile_selector(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, css, e)))
}

/// Links extracted from one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingLinks {
    /// Candidate item addresses, in document order
    pub items: Vec<Url>,

    /// Further listing pages, in document order
    pub pages: Vec<Url>,
}

/// Extracts item and pagination links from a listing page
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `base_url` - Address of the listing page, used to resolve relative hrefs
/// * `selectors` - Compiled catalog selectors
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::crawler::{extract_listing, CatalogSelectors};
/// # fn example(selectors: &CatalogSelectors) {
/// let html = r#"<ul class="file_list"><li><a href="/soft/1.html">One</a></li></ul>"#;
/// let base = url::Url::parse("https://catalog.example.com/list/").unwrap();
/// let links = extract_listing(html, &base, selectors);
/// println!("{} items", links.items.len());
/// # }
/// ```
pub fn extract_listing(html: &str, base_url: &Url, selectors: &CatalogSelectors) -> ListingLinks {
    let document = Html::parse_document(html);

    ListingLinks {
        items: select_links(&document, base_url, &selectors.item),
        pages: select_links(&document, base_url, &selectors.pagination),
    }
}

/// Returns the resolved href of every element matching the selector
pub fn select_links(document: &Html, base_url: &Url, selector: &Selector) -> Vec<Url> {
    document
        .select(selector)
        .filter_map(|element| element_link(element, base_url))
        .collect()
}

/// Returns the resolved href of the first matching element that has one
pub fn first_link(document: &Html, base_url: &Url, selector: &Selector) -> Option<Url> {
    document
        .select(selector)
        .find_map(|element| element_link(element, base_url))
}

/// Returns the trimmed text of the first matching element, if non-empty
pub fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn element_link(element: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    element
        .value()
        .attr("href")
        .and_then(|href| resolve_link(href, base_url))
}
