//! URL handling module for SiteSift
//!
//! This module provides URL canonicalization, site-key extraction and the
//! non-HTML resource filter used by link discovery and frontier admission.

mod domain;
mod normalize;

pub use domain::{site_key, site_key_of};
pub use normalize::{canonicalize, normalize_url};

use url::Url;

/// File extensions that never lead to an HTML page
const NON_HTML_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "bmp", "ico", "tif", "tiff", "zip", "gz",
    "tgz", "tar", "rar", "7z", "bz2", "mp3", "wav", "ogg", "mp4", "m4v", "avi", "mov", "webm",
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "csv", "rtf", "css", "js", "json", "woff",
    "woff2", "ttf", "eot", "exe", "dmg", "apk", "iso",
];

/// Returns true if the URL path ends in a known non-HTML file extension
///
/// The check is case-insensitive and ignores the query string and fragment,
/// so `/files/Report.PDF?dl=1` is a non-HTML resource.
///
/// # Examples
///
/// ```
/// use sitesift::url::is_non_html_resource;
///
/// assert!(is_non_html_resource("https://example.com/brochure.pdf"));
/// assert!(!is_non_html_resource("https://example.com/about"));
/// ```
pub fn is_non_html_resource(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative hrefs: strip query and fragment by hand
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            NON_HTML_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}
