use url::Url;

/// Resolves an href found on a page into an absolute address
///
/// The href is joined against the address of the page it was found on and
/// the fragment is dropped, so two hrefs pointing at the same document from
/// different pages resolve to the same string.
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/list/page2.html").unwrap();
/// let url = resolve_link("../soft/item.html#top", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/soft/item.html");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url)
}

/// Extracts the file extension (with leading dot) from the last path segment
///
/// Mirrors the usual "split off the final suffix" rule: `a.tar.gz` yields
/// `.gz`, a segment without a dot or consisting of a leading dot only
/// (`.profile`) yields None.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::file_extension;
/// use url::Url;
///
/// let url = Url::parse("https://ftp.example.com/pack/game10.lzh").unwrap();
/// assert_eq!(file_extension(&url).as_deref(), Some(".lzh"));
/// ```
pub fn file_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let stem_len = segment.trim_start_matches('.').len();
    let leading_dots = segment.len() - stem_len;
    let dot = segment[leading_dots..].rfind('.')? + leading_dots;

    Some(segment[dot..].to_string())
}
