//! Link discovery
//!
//! Walks a page's anchors and turns them into absolute candidate URLs for
//! the frontier. Canonicalization and site filtering happen in
//! [`Frontier::enqueue`](super::Frontier::enqueue).

use crate::url::is_non_html_resource;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every followable anchor from a parsed document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, `rel="nofollow"` included
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Links to non-HTML resources such as `.pdf`, checked on the raw href
/// - Anything that does not resolve to http(s)
///
/// # Arguments
///
/// * `document` - The parsed static DOM
/// * `base_url` - The page URL used to resolve relative links
///
/// # Returns
///
/// Absolute URLs in document order. Duplicates are left for the frontier.
pub fn discover_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    if is_non_html_resource(href) {
        tracing::trace!("Skipping non-HTML link {}", href);
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
