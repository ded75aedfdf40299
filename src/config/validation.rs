use crate::config::types::{CatalogConfig, Config, HttpConfig, OutputConfig};
use crate::crawler::{resolve_encoding, CatalogSelectors};
use crate::ConfigError;
use url::Url;

/// Upper bound for any timeout, in seconds
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Upper bound for the politeness delay, in milliseconds
const MAX_REQUEST_DELAY_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_catalog_config(&config.catalog)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the request policy
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(referer) = &config.referer {
        Url::parse(referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer '{}': {}", referer, e)))?;
    }

    validate_timeout("timeout_secs", config.timeout_secs)?;
    validate_timeout("download_timeout_secs", config.download_timeout_secs)?;

    if config.request_delay_ms > MAX_REQUEST_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be <= {}ms, got {}ms",
            MAX_REQUEST_DELAY_MS, config.request_delay_ms
        )));
    }

    resolve_encoding(&config.encoding)?;

    Ok(())
}

fn validate_timeout(name: &str, secs: u64) -> Result<(), ConfigError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}

/// Validates catalog roots and markup rules
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.roots.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must list at least one root".to_string(),
        ));
    }

    for root in &config.roots {
        let url = Url::parse(root)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", root, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Root URL '{}' must use HTTP or HTTPS",
                root
            )));
        }
    }

    if config.item_href_contains.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Validation(
            "item_href_contains entries cannot be empty".to_string(),
        ));
    }

    CatalogSelectors::compile(config)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("download_dir", &config.download_dir),
        ("link_list_path", &config.link_list_path),
        ("checkpoint_path", &config.checkpoint_path),
        ("failure_log_path", &config.failure_log_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.checkpoint_path == config.failure_log_path {
        return Err(ConfigError::Validation(
            "checkpoint_path and failure_log_path must differ".to_string(),
        ));
    }

    Ok(())
}
