//! Integration tests for item resolution
//!
//! Each test serves the intro, info and trigger pages of one item from a
//! wiremock server and checks where resolution ends up.

use catalog_harvest::config::{CatalogConfig, HttpConfig};
use catalog_harvest::crawler::{CatalogSelectors, PageFetcher};
use catalog_harvest::pipeline::{ResolutionPipeline, Stage};
use catalog_harvest::PageError;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_config() -> HttpConfig {
    HttpConfig {
        user_agent: "TestHarvester/1.0".to_string(),
        referer: Some("https://catalog.example.com/".to_string()),
        timeout_secs: 5,
        download_timeout_secs: 10,
        request_delay_ms: 0,
        encoding: "utf-8".to_string(),
    }
}

fn selectors() -> CatalogSelectors {
    CatalogSelectors::compile(&CatalogConfig {
        roots: vec!["https://catalog.example.com/list/1".to_string()],
        item_selector: "ul.items a".to_string(),
        item_href_contains: vec![],
        pagination_selector: "div.pager a".to_string(),
        title_selector: "h1.title".to_string(),
        entry_selector: "a.download".to_string(),
        trigger_selector: "a.trigger".to_string(),
        resource_selector: "a.file".to_string(),
        unknown_title: "Unknown".to_string(),
    })
    .unwrap()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolves_through_all_stages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/item/1",
        r#"<h1 class="title"> Star Runner </h1><a class="download" href="/dl/1">Download</a>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/dl/1",
        r#"<a class="trigger" href="/go/1">Start download</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/go/1",
        format!(r#"<a class="file" href="{}/files/star.lzh">here</a>"#, server.uri()),
    )
    .await;

    let fetcher = PageFetcher::new(&http_config()).unwrap();
    let selectors = selectors();
    let pipeline = ResolutionPipeline::new(&fetcher, &selectors, "Unknown");
    let item = format!("{}/item/1", server.uri());

    let resource = pipeline.resolve(&item).await.unwrap();

    assert_eq!(resource.item, item);
    assert_eq!(resource.display_name, "Star Runner");
    assert_eq!(
        resource.resource_url.as_str(),
        format!("{}/files/star.lzh", server.uri())
    );
}

#[tokio::test]
async fn test_missing_title_uses_unknown() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/item/2",
        r#"<a class="download" href="/dl/2">Download</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/dl/2",
        r#"<a class="trigger" href="/go/2">Start</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/go/2",
        r#"<a class="file" href="/files/two.zip">here</a>"#.to_string(),
    )
    .await;

    let fetcher = PageFetcher::new(&http_config()).unwrap();
    let selectors = selectors();
    let pipeline = ResolutionPipeline::new(&fetcher, &selectors, "Unknown");

    let resource = pipeline
        .resolve(&format!("{}/item/2", server.uri()))
        .await
        .unwrap();

    assert_eq!(resource.display_name, "Unknown");
}

#[tokio::test]
async fn test_missing_trigger_fails_at_info_stage() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/item/3",
        r#"<h1 class="title">Broken</h1><a class="download" href="/dl/3">Download</a>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/dl/3", "<p>Maintenance</p>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/go/3"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(&http_config()).unwrap();
    let selectors = selectors();
    let pipeline = ResolutionPipeline::new(&fetcher, &selectors, "Unknown");

    let failure = pipeline
        .resolve(&format!("{}/item/3", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::Info);
    assert!(matches!(
        failure.error,
        PageError::ExtractionMissing {
            element: "trigger link",
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_intro_fails_at_intro_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(&http_config()).unwrap();
    let selectors = selectors();
    let pipeline = ResolutionPipeline::new(&fetcher, &selectors, "Unknown");

    let failure = pipeline
        .resolve(&format!("{}/item/4", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::Intro);
    assert!(failure.error.is_unreachable());
}

#[tokio::test]
async fn test_non_http_resource_fails_at_trigger_stage() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/item/5",
        r#"<h1 class="title">Old</h1><a class="download" href="/dl/5">Download</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/dl/5",
        r#"<a class="trigger" href="/go/5">Start</a>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/go/5",
        r#"<a class="file" href="mailto:admin@example.com">contact</a>"#.to_string(),
    )
    .await;

    let fetcher = PageFetcher::new(&http_config()).unwrap();
    let selectors = selectors();
    let pipeline = ResolutionPipeline::new(&fetcher, &selectors, "Unknown");

    let failure = pipeline
        .resolve(&format!("{}/item/5", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::Trigger);
    assert!(matches!(failure.error, PageError::ExtractionMissing { .. }));
}

#[tokio::test]
async fn test_invalid_item_reference_fails_at_intro_stage() {
    let fetcher = PageFetcher::new(&http_config()).unwrap();
    let selectors = selectors();
    let pipeline = ResolutionPipeline::new(&fetcher, &selectors, "Unknown");

    let failure = pipeline.resolve("not a url").await.unwrap_err();

    assert_eq!(failure.stage, Stage::Intro);
    assert!(failure.error.is_unreachable());
}

#[tokio::test]
async fn test_configured_encoding_overrides_declared_charset() {
    let server = MockServer::start().await;

    // "夜" in Shift_JIS, served under a wrong charset label
    let mut body = b"<h1 class=\"title\">".to_vec();
    body.extend_from_slice(&[0x96, 0xE9]);
    body.extend_from_slice(b"</h1>");
    Mock::given(method("GET"))
        .and(path("/item/6"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=iso-8859-1"),
        )
        .mount(&server)
        .await;

    let mut config = http_config();
    config.encoding = "shift_jis".to_string();
    let fetcher = PageFetcher::new(&config).unwrap();

    let page = fetcher
        .fetch(&Url::parse(&format!("{}/item/6", server.uri())).unwrap())
        .await
        .unwrap();

    assert_eq!(page.body, "<h1 class=\"title\">夜</h1>");
}
