//! SiteSift: a same-site crawl-and-extract engine
//!
//! This crate discovers pages on a single site starting from a seed URL,
//! fetches and parses them into structured page records, falls back to a
//! headless-browser render when static parsing is insufficient, and streams
//! each record to the caller as soon as it is finished.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod robots;
pub mod stats;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for SiteSift operations
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to start headless browser: {0}")]
    Browser(#[from] crawler::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Seed URL {url} was not admitted to the frontier: {reason}")]
    SeedRejected { url: String, reason: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for SiteSift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlSession, ProgressSink, SessionHandle};
pub use record::{PageRecord, PageStatus, ParseMethod, SessionStatus};
pub use stats::CrawlStats;
pub use crate::url::normalize_url;
