use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for SiteSift
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How robots.txt decisions are applied to frontier admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotsPolicy {
    /// Disallowed URLs are never enqueued
    #[default]
    Enforce,
    /// Disallowed URLs are logged and enqueued anyway
    Advisory,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight per round
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: u32,

    /// Timeout for a single HTTP fetch (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Timeout for a browser navigation (milliseconds)
    #[serde(rename = "render-timeout-ms", default = "default_render_timeout")]
    pub render_timeout_ms: u64,

    /// Minimum time between successive fetch dispatches, across all workers (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Pages below this many words are `partial` and escalate to rendering
    #[serde(rename = "min-word-count", default = "default_min_word_count")]
    pub min_word_count: usize,

    #[serde(rename = "robots-policy", default)]
    pub robots_policy: RobotsPolicy,
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            fetch_timeout_secs: default_fetch_timeout(),
            render_timeout_ms: default_render_timeout(),
            request_delay_ms: default_request_delay(),
            min_word_count: default_min_word_count(),
            robots_policy: RobotsPolicy::default(),
        }
    }
}

fn default_max_workers() -> u32 {
    5
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_render_timeout() -> u64 {
    30_000
}

fn default_request_delay() -> u64 {
    1_000
}

fn default_min_word_count() -> usize {
    100
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteSift".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

/// Headless browser configuration for the rendering fallback
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Path to a Chrome/Chromium binary; auto-detected when absent
    #[serde(default)]
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            executable: None,
        }
    }
}

fn default_headless() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the markdown crawl report
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            report_path: default_report_path(),
        }
    }
}

fn default_database_path() -> String {
    "./sitesift.db".to_string()
}

fn default_report_path() -> String {
    "./crawl-report.md".to_string()
}
