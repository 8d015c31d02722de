// src/utils/url.rs

//! URL manipulation utilities.

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// # Examples
/// ```
/// use xword_roundup::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/path/", "page.html"),
///     Some("https://example.com/path/page.html".to_string())
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> Option<String> {
    Url::parse(base)
        .ok()
        .and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
}

/// Extract the lowercase host from a URL.
pub fn get_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

/// Drop everything from the first `&`, which feed redirectors use for
/// tracking parameters.
pub fn strip_tracking(link: &str) -> &str {
    link.split('&').next().unwrap_or(link)
}

/// Append a throwaway query parameter so caches hand back a fresh copy.
pub fn cache_bust(url: &str, token: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{token}")
}

/// The decoded last path segment of a URL, ignoring any query string.
pub fn path_file_name(link: &str) -> Option<String> {
    let path = link.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }
    Some(percent_decode_str(last).decode_utf8_lossy().into_owned())
}

/// The path segment following `component`, e.g. the puzzle id after
/// `crosswords` in `https://host/crosswords/abc123/title`.
pub fn segment_after(link: &str, component: &str) -> Option<String> {
    let mut segments = link.split(['?', '#']).next()?.split('/');
    segments.find(|s| *s == component)?;
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract the file name from a `Content-Disposition` header value.
pub fn content_disposition_file_name(value: &str) -> Option<String> {
    let pattern = Regex::new(r"filename=(.+)").ok()?;
    let raw = pattern.captures(value)?.get(1)?.as_str();
    let name = raw.split(';').next()?.trim().trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

/// Rewrite cloud-storage share links into direct-download endpoints.
pub fn rewrite_share_link(link: &str) -> String {
    if link.contains("drive.google.com/file") {
        if let Some(id) = segment_after(link, "d") {
            return format!("https://drive.google.com/uc?export=download&id={id}");
        }
    } else if link.contains("dropbox.com") && !link.ends_with("dl=1") {
        let separator = if link.contains('?') { '&' } else { '?' };
        return format!("{link}{separator}dl=1");
    }
    link.to_string()
}

/// Reduce a suggested file name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() || c == ':' { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "puzzle".to_string()
    } else {
        cleaned
    }
}
