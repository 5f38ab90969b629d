use crate::UrlError;
use url::Url;

/// Normalizes a URL to its canonical `scheme://host[:port]/path` form
///
/// The canonical form is the identity key used for all frontier dedup.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS schemes
/// 3. Lowercase the host (done by the parser) and keep a non-default port
/// 4. Keep the path exactly as parsed (dot segments already resolved, empty path becomes `/`)
/// 5. Drop the query string and the fragment
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - Canonical URL
/// * `Err(UrlError)` - Failed to parse the URL
///
/// # Examples
///
/// ```
/// use sitesift::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/docs?page=2#intro").unwrap();
/// assert_eq!(url, "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(&url)
}

/// Canonicalizes an already-parsed URL
pub fn canonicalize(url: &Url) -> Result<String, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    })
}
