//! HTTP fetcher implementation
//!
//! This module handles all page requests made by the crawler and the
//! resolution pipeline, including:
//! - Building the HTTP client with the fixed header set
//! - Pacing requests so the origin never sees more than one request per interval
//! - GET requests with a per-request timeout
//! - Decoding every body with the configured encoding
//! - Error classification

use crate::config::HttpConfig;
use crate::{ConfigError, HarvestError, PageError};
use encoding_rs::Encoding;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Connect timeout applied to every request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// Decoded page body
    pub body: String,
}

/// Global request-rate cap shared by every component that talks to the origin
///
/// Each call to [`Pacer::wait`] returns no earlier than `interval` after the
/// previous call returned.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Creates a pacer enforcing the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    /// Creates a pacer from a millisecond interval
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Waits until the next request may be sent
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Builds the HTTP client shared by the page fetcher and the resource retriever
///
/// The User-Agent and Referer headers are attached to every request. Redirects
/// are followed with reqwest's default policy since catalog landing pages
/// commonly bounce through mirrors.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    if let Some(referer) = &config.referer {
        let value = HeaderValue::from_str(referer).map_err(|e| {
            ConfigError::Validation(format!("referer is not a valid header value: {}", e))
        })?;
        headers.insert(REFERER, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Performs page GETs under the configured request policy
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    pacer: Arc<Pacer>,
    timeout: Duration,
    encoding: &'static Encoding,
}

impl PageFetcher {
    /// Creates a fetcher with its own client and pacer
    pub fn new(config: &HttpConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(config)?;
        let pacer = Arc::new(Pacer::from_millis(config.request_delay_ms));
        Self::with_client(client, pacer, config)
    }

    /// Creates a fetcher around an existing client and pacer
    ///
    /// Fails if the configured encoding label is unknown.
    pub fn with_client(
        client: Client,
        pacer: Arc<Pacer>,
        config: &HttpConfig,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            client,
            pacer,
            timeout: Duration::from_secs(config.timeout_secs),
            encoding: resolve_encoding(&config.encoding)?,
        })
    }

    /// Fetches a page and decodes its body
    ///
    /// The body is always decoded with the configured encoding. A charset
    /// declared by the server is ignored, since catalog sites often mislabel it.
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - 2xx response with a decodable body
    /// * `Err(PageError::Unreachable)` - transport failure, timeout, or non-2xx status
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, PageError> {
        self.pacer.wait().await;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| unreachable(url, describe_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(url, format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| unreachable(url, describe_error(&e)))?;
        let (body, had_errors) = self.encoding.decode_without_bom_handling(&bytes);
        if had_errors {
            tracing::debug!(
                "{} is not valid {}, bad sequences replaced",
                url,
                self.encoding.name()
            );
        }

        Ok(FetchedPage {
            url: final_url,
            body: body.into_owned(),
        })
    }
}

/// Looks up an encoding by its WHATWG label (`utf-8`, `shift_jis`, `euc-jp`, ...)
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ConfigError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ConfigError::Validation(format!("Unknown encoding label '{}'", label)))
}

fn unreachable(url: &Url, reason: String) -> PageError {
    PageError::Unreachable {
        url: url.to_string(),
        reason,
    }
}

/// Classifies a reqwest error into a short human-readable reason
pub(crate) fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
