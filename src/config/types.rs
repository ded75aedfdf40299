use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
}

/// Outbound request policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Referer header sent with every request
    #[serde(default)]
    pub referer: Option<String>,

    /// Per-request timeout for catalog and landing pages (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Longest stall allowed while receiving a resource (seconds)
    ///
    /// Bounds the wait for response headers and every gap between body
    /// chunks. A slow transfer that keeps making progress never times out.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Minimum time between two outbound requests (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Encoding label every page body is decoded with (`utf-8`, `shift_jis`, ...)
    ///
    /// A charset declared by the server is ignored.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Catalog roots and the markup rules used to walk them
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogConfig {
    /// Listing pages the discovery crawl starts from
    pub roots: Vec<String>,

    /// Anchors on a listing page that point at items
    pub item_selector: String,

    /// Fragments an item href must contain to be kept
    #[serde(default)]
    pub item_href_contains: Vec<String>,

    /// Anchors on a listing page that point at further listing pages
    pub pagination_selector: String,

    /// Element holding the item title on the intro page
    pub title_selector: String,

    /// Anchor on the intro page leading to the download info page
    pub entry_selector: String,

    /// Anchor on the info page leading to the download trigger page
    pub trigger_selector: String,

    /// Anchor on the trigger page holding the final resource address
    pub resource_selector: String,

    /// Display name used when the intro page has no title
    #[serde(default = "default_unknown_title")]
    pub unknown_title: String,
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving downloaded resources
    pub download_dir: String,

    /// Snapshot of all discovered item references
    pub link_list_path: String,

    /// Append-only record of completed items
    pub checkpoint_path: String,

    /// Append-only record of failed items
    pub failure_log_path: String,

    /// Draw a byte progress bar while downloading
    #[serde(default)]
    pub progress_bar: bool,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_download_timeout_secs() -> u64 {
    180
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_unknown_title() -> String {
    "Unknown".to_string()
}
