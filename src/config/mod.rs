//! Configuration module for SiteSift
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section except `[user-agent]` may be omitted and falls back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use sitesift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, RobotsPolicy, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
