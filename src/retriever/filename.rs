//! Destination file names derived from item titles

use crate::url::file_extension;
use url::Url;

/// Sanitizes a display name for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`\ / : * ? " < > |` and control characters) with `_`, then trims leading
/// and trailing dots and spaces.
///
/// # Examples
///
/// ```
/// use catalog_harvest::sanitize_filename;
///
/// assert_eq!(sanitize_filename("A/B:C*D"), "A_B_C_D");
/// assert_eq!(sanitize_filename(" .hidden title. "), "hidden title");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    replaced.trim_matches(|c| c == '.' || c == ' ').to_string()
}

/// Builds the destination file name `<sanitized display name><extension>`
///
/// The extension comes from the last path segment of the resource address.
/// A display name that sanitizes to nothing falls back to `fallback_name`.
pub fn destination_file_name(display_name: &str, resource_url: &Url, fallback_name: &str) -> String {
    let mut stem = sanitize_filename(display_name);
    if stem.is_empty() {
        stem = sanitize_filename(fallback_name);
    }
    if stem.is_empty() {
        stem = "_".to_string();
    }

    match file_extension(resource_url) {
        Some(extension) => format!("{}{}", stem, extension),
        None => stem,
    }
}
