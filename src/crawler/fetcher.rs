//! HTTP fetcher implementation
//!
//! This module handles the plain HTTP side of page acquisition:
//! - Building the shared client with the configured user agent
//! - GET requests with a per-request timeout
//! - Error classification into [`FetchError`]

use crate::config::UserAgentConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why a page could not be fetched
///
/// The `Display` text becomes the `error_message` of the page's fail record.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, empty when absent
    pub content_type: String,

    /// Response body decoded as text
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy and both http and
/// https are permitted.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Total time allowed per request
///
/// # Example
///
/// ```no_run
/// use sitesift::config::UserAgentConfig;
/// use sitesift::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig::default();
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Ok(FetchedPage)` |
/// | Any other status | `FetchError::Status` |
/// | Timeout | `FetchError::Timeout` |
/// | Connection refused, DNS, TLS | `FetchError::Connect` |
/// | Undecodable body | `FetchError::Body` |
///
/// The Content-Type is recorded but not enforced; the parser decides what
/// it can make of the body.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(e, timeout))?;

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        tracing::debug!("GET {} returned HTTP {}", url, status.as_u16());
        return Err(FetchError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Body(e.to_string())
        }
    })?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
    })
}

fn classify_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else if error.is_connect() {
        FetchError::Connect(error.to_string())
    } else {
        FetchError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn client() -> Client {
        build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header(
                "user-agent",
                "TestCrawler/1.0 (+https://example.com/about; admin@example.com)",
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><title>Hi</title></html>", "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let page = fetch_page(&client(), &url, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(page.status_code, 200);
        assert!(page.content_type.starts_with("text/html"));
        assert!(page.body.contains("<title>Hi</title>"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let err = fetch_page(&client(), &url, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status(404)));
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let url = format!("{}/old", server.uri());
        let page = fetch_page(&client(), &url, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(page.final_url.ends_with("/new"));
        assert_eq!(page.body, "moved");
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let url = format!("{}/slow", server.uri());
        let err = fetch_page(&client(), &url, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let err = fetch_page(&client(), "http://127.0.0.1:9/", Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::Connect(_) | FetchError::Request(_) | FetchError::Timeout(_)
        ));
    }
}
