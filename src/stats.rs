//! Aggregate statistics for one crawl

use crate::record::PageRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page that failed, with the error that was recorded for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub error: String,
}

/// Crawl statistics
///
/// Updated by the session driver after every page and finalized once when
/// the crawl ends. Snapshots taken before the end are partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Pages fetched or still waiting in the frontier
    pub total_pages_found: u64,

    /// Pages whose fetch was attempted
    pub pages_parsed: u64,

    /// Pages that produced a `success` or `partial` record
    pub successful_pages: u64,

    pub failed_pages: u64,
    pub failed_urls: Vec<FailedUrl>,

    pub elapsed_seconds: f64,
}

impl CrawlStats {
    /// Marks the crawl start
    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
    }

    /// Folds one emitted record into the counters
    pub fn record_page(&mut self, record: &PageRecord) {
        if record.is_failure() {
            self.failed_pages += 1;
            self.failed_urls.push(FailedUrl {
                url: record.url.clone(),
                error: record.error_message.clone().unwrap_or_default(),
            });
        } else {
            self.successful_pages += 1;
        }
    }

    /// Stamps the end time and elapsed seconds
    pub fn finish(&mut self, total_pages_found: u64) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.total_pages_found = total_pages_found;
        if let Some(started) = self.started_at {
            self.elapsed_seconds = (now - started).num_milliseconds().max(0) as f64 / 1000.0;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Percentage of attempted pages that did not fail
    pub fn success_rate(&self) -> f64 {
        if self.pages_parsed == 0 {
            0.0
        } else {
            self.successful_pages as f64 / self.pages_parsed as f64 * 100.0
        }
    }
}
