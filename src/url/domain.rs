use url::Url;

/// Extracts the site key (`host[:port]`) from a URL
///
/// Two URLs belong to the same site when their site keys are equal. The port
/// is part of the key, so `example.com` and `example.com:8080` are different
/// sites, while subdomains are always distinct sites.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitesift::url::site_key;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(site_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:3000/").unwrap();
/// assert_eq!(site_key(&url), Some("127.0.0.1:3000".to_string()));
/// ```
pub fn site_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Parses a URL string and returns its site key
pub fn site_key_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(site_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(site_key(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_subdomain_is_distinct() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(site_key(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(site_key(&url), Some("example.com:8080".to_string()));
    }

    #[test]
    fn test_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(site_key(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_site_key_of_invalid() {
        assert_eq!(site_key_of("not a url"), None);
        assert_eq!(site_key_of("mailto:someone@example.com"), None);
    }
}
