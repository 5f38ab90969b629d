//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end. Rendering goes through a scripted
//! renderer so no browser is needed.

use async_trait::async_trait;
use futures::StreamExt;
use sitesift::config::{Config, RobotsPolicy};
use sitesift::crawler::{RenderError, RenderTab, Renderer};
use sitesift::storage::{RecordKeys, SqliteStorage, Storage};
use sitesift::{CrawlSession, PageRecord, PageStatus, ParseMethod, SessionStatus, SiftError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renderer that serves fixed HTML per URL and counts tab usage
#[derive(Default)]
struct FakeRenderer {
    pages: HashMap<String, String>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeRenderer {
    fn with_page(mut self, url: String, html: String) -> Self {
        self.pages.insert(url, html);
        self
    }
}

struct FakeTab {
    pages: HashMap<String, String>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open_tab(&self) -> Result<Box<dyn RenderTab>, RenderError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTab {
            pages: self.pages.clone(),
            current: None,
            closed: Arc::clone(&self.closed),
        }))
    }

    async fn shutdown(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

#[async_trait]
impl RenderTab for FakeTab {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        if self.pages.contains_key(url) {
            self.current = Some(url.to_string());
            Ok(())
        } else {
            Err(RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_FAILED".to_string(),
            })
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .cloned()
            .ok_or_else(|| RenderError::Content("no document".to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_delay_ms = 0;
    config.crawler.max_workers = 3;
    config
}

/// `count` distinct words
fn words(count: usize) -> String {
    (0..count)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn rich_page(title: &str, heading: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>", href, href))
        .collect();
    format!(
        r#"<html><head><title>{title}</title>
        <meta name="description" content="{title} page"></head>
        <body><nav><a href="/">Home</a></nav>
        <main><h1>{heading}</h1><h2>Overview</h2><p>{body}</p></main>
        <footer>{anchors}</footer></body></html>"#,
        body = words(200)
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn collect(session: CrawlSession) -> Vec<PageRecord> {
    session
        .records()
        .map(|item| item.expect("crawl should not fail"))
        .collect()
        .await
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        rich_page(
            "Home",
            "Welcome",
            &["/about", "/contact", "https://elsewhere.test/x", "/brochure.pdf"],
        ),
    )
    .await;
    mount_page(&server, "/about", rich_page("About", "About us", &["/"])).await;
    mount_page(&server, "/contact", rich_page("Contact", "Reach us", &["/about"])).await;

    let renderer = Arc::new(FakeRenderer::default());
    let opened = Arc::clone(&renderer.opened);

    let session = CrawlSession::new(&format!("{}/", base), "it-1", Arc::new(test_config()))
        .unwrap()
        .with_renderer(renderer);
    let handle = session.handle();
    let records = collect(session).await;

    assert_eq!(records.len(), 3);
    let home = records
        .iter()
        .find(|r| r.url == format!("{}/", base))
        .expect("home page record");
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert_eq!(home.h1.as_deref(), Some("Welcome"));
    assert_eq!(home.meta_description.as_deref(), Some("Home page"));
    assert_eq!(home.h2, vec!["Overview".to_string()]);
    assert!(home.word_count >= 200);
    assert!(home.full_text.contains("[TITLE]Home[/TITLE]"));

    for record in &records {
        assert_eq!(record.status, PageStatus::Success);
        assert_eq!(record.parse_method, Some(ParseMethod::Static));
        assert!(record.error_message.is_none());
    }

    assert_eq!(opened.load(Ordering::SeqCst), 0);
    assert_eq!(handle.status(), SessionStatus::Completed);
    let stats = handle.stats();
    assert_eq!(stats.total_pages_found, 3);
    assert_eq!(stats.pages_parsed, 3);
    assert_eq!(stats.successful_pages, 3);
    assert!(stats.failed_urls.is_empty());
}

#[tokio::test]
async fn test_thin_page_escalates_to_render() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        format!("<html><body><div id=\"app\"></div><p>{}</p></body></html>", words(10)),
    )
    .await;

    let renderer = Arc::new(
        FakeRenderer::default().with_page(seed.clone(), rich_page("Rendered", "Hydrated", &[])),
    );
    let opened = Arc::clone(&renderer.opened);
    let closed = Arc::clone(&renderer.closed);

    let session = CrawlSession::new(&seed, "it-render", Arc::new(test_config()))
        .unwrap()
        .with_renderer(renderer);
    let records = collect(session).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.parse_method, Some(ParseMethod::Rendered));
    assert_eq!(record.status, PageStatus::Success);
    assert_eq!(record.title.as_deref(), Some("Rendered"));
    assert_eq!(record.h1.as_deref(), Some("Hydrated"));
    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_render_failure_records_fail() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    mount_page(
        &server,
        "/",
        "<html><body><p>tiny</p><a href=\"/next\">next</a></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let renderer = Arc::new(FakeRenderer::default());
    let closed = Arc::clone(&renderer.closed);

    let session = CrawlSession::new(&seed, "it-render-fail", Arc::new(test_config()))
        .unwrap()
        .with_renderer(renderer);
    let handle = session.handle();
    let records = collect(session).await;

    assert_eq!(records.len(), 1);
    assert!(records[0].is_failure());
    assert!(records[0]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("net::ERR_FAILED"));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert_eq!(handle.status(), SessionStatus::Completed);
    assert_eq!(handle.stats().failed_pages, 1);
}

#[tokio::test]
async fn test_unreachable_seed_yields_fail_record() {
    // Reserve a port, then free it so nothing is listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let seed = format!("http://127.0.0.1:{}/", port);

    let session = CrawlSession::new(&seed, "it-dead", Arc::new(test_config()))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));
    let handle = session.handle();
    let records = collect(session).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, seed);
    assert_eq!(records[0].status, PageStatus::Fail);
    assert!(records[0].error_message.is_some());
    assert_eq!(handle.status(), SessionStatus::Completed);
    assert_eq!(handle.stats().failed_urls.len(), 1);
}

#[tokio::test]
async fn test_connection_error_does_not_stop_crawl() {
    let server = MockServer::start().await;
    let dead_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    mount_page(&server, "/", rich_page("Home", "Welcome", &["/moved", "/next"])).await;
    // Same-site URL whose fetch ends in a refused connection
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("http://127.0.0.1:{}/gone", dead_port).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/next", rich_page("Next", "Next page", &[])).await;

    let mut config = test_config();
    config.crawler.max_workers = 1;

    let session = CrawlSession::new(&format!("{}/", server.uri()), "it-conn", Arc::new(config))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));
    let handle = session.handle();
    let records = collect(session).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].url, format!("{}/moved", server.uri()));
    assert_eq!(records[1].status, PageStatus::Fail);
    assert!(records[1].error_message.is_some());
    assert_eq!(records[2].url, format!("{}/next", server.uri()));
    assert_eq!(records[2].status, PageStatus::Success);

    assert_eq!(handle.status(), SessionStatus::Completed);
    let stats = handle.stats();
    assert_eq!(stats.failed_pages, 1);
    assert_eq!(stats.successful_pages, 2);
}

#[tokio::test]
async fn test_robots_advisory_admits_disallowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
        .mount(&server)
        .await;
    mount_page(&server, "/", rich_page("Home", "Welcome", &["/admin"])).await;
    mount_page(&server, "/admin", rich_page("Admin", "Admin", &[])).await;

    let mut config = test_config();
    config.crawler.robots_policy = RobotsPolicy::Advisory;

    let session = CrawlSession::new(&format!("{}/", server.uri()), "it-advisory", Arc::new(config))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));
    let records = collect(session).await;

    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| r.url.ends_with("/admin")));
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
        .mount(&server)
        .await;
    mount_page(&server, "/", rich_page("Home", "Welcome", &["/admin", "/allowed"])).await;
    mount_page(&server, "/allowed", rich_page("Allowed", "Allowed", &[])).await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = CrawlSession::new(&format!("{}/", server.uri()), "it-robots", Arc::new(test_config()))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));
    let handle = session.handle();
    let records = collect(session).await;

    assert_eq!(records.len(), 2);
    assert_eq!(handle.stats().total_pages_found, 2);
}

#[tokio::test]
async fn test_request_delay_spaces_dispatches() {
    let server = MockServer::start().await;
    mount_page(&server, "/", rich_page("Home", "Welcome", &["/a", "/b"])).await;
    mount_page(&server, "/a", rich_page("A", "A", &[])).await;
    mount_page(&server, "/b", rich_page("B", "B", &[])).await;

    let mut config = test_config();
    config.crawler.request_delay_ms = 150;

    let session = CrawlSession::new(&format!("{}/", server.uri()), "it-delay", Arc::new(config))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));

    let started = Instant::now();
    let records = collect(session).await;

    // Three dispatches need at least two full gaps
    assert_eq!(records.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_stop_flag_ends_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", rich_page("Home", "Welcome", &["/a", "/b"])).await;

    let mut config = test_config();
    config.crawler.max_workers = 1;

    let session = CrawlSession::new(&format!("{}/", server.uri()), "it-stop", Arc::new(config))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));
    let handle = session.handle();
    let mut stream = session.records();

    assert!(stream.next().await.unwrap().is_ok());
    handle.stop();
    assert!(stream.next().await.is_none());

    assert_eq!(handle.status(), SessionStatus::Stopped);
    assert!(handle.stats().is_finished());
}

#[tokio::test]
async fn test_browser_launch_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.browser.executable = Some("/nonexistent/sitesift-test-browser".to_string());

    let session =
        CrawlSession::new(&format!("{}/", server.uri()), "it-fatal", Arc::new(config)).unwrap();
    let handle = session.handle();
    let items: Vec<_> = session.records().collect().await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(SiftError::Browser(_))));
    assert_eq!(handle.status(), SessionStatus::Failed);
}

#[tokio::test]
async fn test_records_persist_with_dedup() {
    let server = MockServer::start().await;
    mount_page(&server, "/", rich_page("Home", "Welcome", &["/about"])).await;
    mount_page(&server, "/about", rich_page("About", "About us", &[])).await;

    let session = CrawlSession::new(&format!("{}/", server.uri()), "it-store", Arc::new(test_config()))
        .unwrap()
        .with_renderer(Arc::new(FakeRenderer::default()));
    let seed = session.seed().to_string();
    let handle = session.handle();
    let records = collect(session).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage.create_session("it-store", &seed, "hash").unwrap();
    let keys = RecordKeys {
        batch_id: "it-store".to_string(),
        site_id: Some(4),
        user_id: None,
    };

    for record in &records {
        assert!(storage.save_page(record, &keys).unwrap());
    }
    // Re-saving the same records inserts nothing
    for record in &records {
        assert!(!storage.save_page(record, &keys).unwrap());
    }
    storage
        .finish_session("it-store", handle.status(), &handle.stats())
        .unwrap();

    assert_eq!(storage.count_pages("it-store").unwrap(), 2);
    let stored = storage.load_pages("it-store").unwrap();
    assert_eq!(stored, records);

    let session_row = storage.get_session("it-store").unwrap().unwrap();
    assert_eq!(session_row.status, SessionStatus::Completed);
    assert_eq!(session_row.pages_crawled, 2);
}
