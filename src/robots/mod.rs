//! Robots.txt handling module
//!
//! robots.txt is fetched once per crawl from the root host. A missing or
//! unreadable file never aborts the crawl; the site is treated as unrestricted.

mod parser;

pub use parser::ParsedRobots;

use crate::config::RobotsPolicy;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Longest gap between dispatches a robots.txt can impose
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// The robots decision point consulted by the frontier on every enqueue
#[derive(Debug, Clone)]
pub struct RobotsGate {
    robots: ParsedRobots,
    policy: RobotsPolicy,
    agent_token: String,
    crawl_delay: Option<Duration>,
}

impl RobotsGate {
    /// Creates a gate for the given rules, policy and user-agent product token
    ///
    /// The agent's `Crawl-delay` is resolved here, once per crawl.
    pub fn new(robots: ParsedRobots, policy: RobotsPolicy, agent_token: impl Into<String>) -> Self {
        let agent_token = agent_token.into();
        let crawl_delay = match policy {
            RobotsPolicy::Enforce => robots.crawl_delay(&agent_token).and_then(bounded_delay),
            RobotsPolicy::Advisory => None,
        };
        Self {
            robots,
            policy,
            agent_token,
            crawl_delay,
        }
    }

    /// A gate that admits everything
    pub fn unrestricted() -> Self {
        Self::new(ParsedRobots::allow_all(), RobotsPolicy::Enforce, "*")
    }

    /// Decides whether a canonical URL may enter the frontier
    ///
    /// Under [`RobotsPolicy::Advisory`] a disallowed URL is logged and admitted.
    pub fn admits(&self, url: &str) -> bool {
        if self.robots.is_allowed(url, &self.agent_token) {
            return true;
        }

        match self.policy {
            RobotsPolicy::Enforce => {
                tracing::debug!("URL {} disallowed by robots.txt", url);
                false
            }
            RobotsPolicy::Advisory => {
                tracing::warn!(
                    "URL {} disallowed by robots.txt, admitting under advisory policy",
                    url
                );
                true
            }
        }
    }

    /// Crawl-delay requested for our agent, only honoured when enforcing
    ///
    /// Never longer than [`MAX_CRAWL_DELAY`].
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }
}

/// Converts a raw `Crawl-delay` into a usable gap
///
/// Zero, negative and NaN values mean no delay. Values past
/// [`MAX_CRAWL_DELAY`], including ones too large for `Duration`, are clamped.
fn bounded_delay(secs: f64) -> Option<Duration> {
    if secs.is_nan() || secs <= 0.0 {
        return None;
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(delay) if delay <= MAX_CRAWL_DELAY => Some(delay),
        _ => {
            tracing::warn!(
                "robots.txt Crawl-delay of {}s exceeds {:?}, using {:?}",
                secs,
                MAX_CRAWL_DELAY,
                MAX_CRAWL_DELAY
            );
            Some(MAX_CRAWL_DELAY)
        }
    }
}

/// Fetches robots.txt from the root of the given site
///
/// # Returns
///
/// The parsed rules, or [`ParsedRobots::allow_all`] when the file cannot be
/// fetched (network failure, non-2xx status, unreadable body).
pub async fn fetch_robots(client: &Client, root: &Url) -> ParsedRobots {
    let robots_url = match root.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Could not build robots.txt URL for {}: {}", root, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching robots.txt from {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not read robots.txt at {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::warn!(
            "Could not read robots.txt at {}: HTTP {}",
            robots_url,
            response.status().as_u16()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Could not read robots.txt body at {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
