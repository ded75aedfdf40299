//! Integration tests for catalog discovery
//!
//! These tests use wiremock to serve small paginated catalogs and check
//! what the crawler collects from them.

use catalog_harvest::config::{CatalogConfig, HttpConfig};
use catalog_harvest::crawler::{CatalogCrawler, CatalogSelectors, PageFetcher};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_config() -> HttpConfig {
    HttpConfig {
        user_agent: "TestHarvester/1.0".to_string(),
        referer: None,
        timeout_secs: 5,
        download_timeout_secs: 10,
        request_delay_ms: 0,
        encoding: "utf-8".to_string(),
    }
}

fn catalog_config(roots: Vec<String>) -> CatalogConfig {
    CatalogConfig {
        roots,
        item_selector: "ul.items a".to_string(),
        item_href_contains: vec![],
        pagination_selector: "div.pager a".to_string(),
        title_selector: "h1.title".to_string(),
        entry_selector: "a.download".to_string(),
        trigger_selector: "a.trigger".to_string(),
        resource_selector: "a.file".to_string(),
        unknown_title: "Unknown".to_string(),
    }
}

/// Renders a listing page with the given item and pagination hrefs
fn listing(items: &[&str], pages: &[&str]) -> ResponseTemplate {
    let items: String = items
        .iter()
        .map(|href| format!(r#"<li><a href="{}">item</a></li>"#, href))
        .collect();
    let pages: String = pages
        .iter()
        .map(|href| format!(r#"<a href="{}">next</a>"#, href))
        .collect();
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><body><ul class="items">{}</ul><div class="pager">{}</div></body></html>"#,
            items, pages
        ))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn discover(
    server: &MockServer,
    roots: &[&str],
    fragments: Vec<String>,
) -> Vec<String> {
    let roots: Vec<Url> = roots
        .iter()
        .map(|p| Url::parse(&format!("{}{}", server.uri(), p)).unwrap())
        .collect();
    let config = catalog_config(roots.iter().map(|u| u.to_string()).collect());
    let selectors = CatalogSelectors::compile(&config).unwrap();
    let fetcher = PageFetcher::new(&http_config()).unwrap();

    CatalogCrawler::new(&fetcher, &selectors)
        .with_href_fragments(fragments)
        .discover(&roots)
        .await
}

#[tokio::test]
async fn test_pagination_cycle_terminates_with_unique_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list/1"))
        .respond_with(listing(&["/item/1", "/item/2"], &["/list/2"]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/2"))
        .respond_with(listing(&["/item/2", "/item/1"], &["/list/1"]))
        .expect(1)
        .mount(&server)
        .await;

    let items = discover(&server, &["/list/1"], vec![]).await;

    assert_eq!(
        items,
        vec![
            format!("{}/item/1", server.uri()),
            format!("{}/item/2", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_failing_listing_page_is_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list/1"))
        .respond_with(listing(&["/item/1"], &["/list/broken", "/list/2"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/2"))
        .respond_with(listing(&["/item/3"], &[]))
        .mount(&server)
        .await;

    let items = discover(&server, &["/list/1"], vec![]).await;

    assert_eq!(
        items,
        vec![
            format!("{}/item/1", server.uri()),
            format!("{}/item/3", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_unreachable_root_yields_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let items = discover(&server, &["/list/1"], vec![]).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_href_fragment_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list/1"))
        .respond_with(listing(
            &["/soft/1.html", "/ads/banner.html", "/soft/2.html"],
            &[],
        ))
        .mount(&server)
        .await;

    let items = discover(&server, &["/list/1"], vec!["/soft/".to_string()]).await;

    assert_eq!(
        items,
        vec![
            format!("{}/soft/1.html", server.uri()),
            format!("{}/soft/2.html", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_roots_share_visited_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/a"))
        .respond_with(listing(&["/item/1"], &["/list/shared"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/genre/b"))
        .respond_with(listing(&["/item/2"], &["/list/shared"]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/shared"))
        .respond_with(listing(&["/item/3", "/item/1"], &[]))
        .expect(1)
        .mount(&server)
        .await;

    let items = discover(&server, &["/genre/a", "/genre/b"], vec![]).await;

    assert_eq!(
        items,
        vec![
            format!("{}/item/1", server.uri()),
            format!("{}/item/3", server.uri()),
            format!("{}/item/2", server.uri()),
        ]
    );
}
