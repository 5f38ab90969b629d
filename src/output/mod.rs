//! Output module for crawl statistics and reports
//!
//! This module handles:
//! - Printing crawl statistics to the terminal
//! - Generating markdown crawl reports from live records or the database

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_report, generate_markdown_report, CrawlReport};
pub use stats::print_statistics;

use crate::storage::{Storage, StorageError};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No crawl session found for batch {0}")]
    MissingSession(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Builds a report for a stored batch
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `batch_id` - The batch to report on
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Report assembled from the session row and its pages
/// * `Err(OutputError)` - The batch is unknown or storage failed
pub fn load_report(storage: &dyn Storage, batch_id: &str) -> OutputResult<CrawlReport> {
    let session = storage
        .get_session(batch_id)?
        .ok_or_else(|| OutputError::MissingSession(batch_id.to_string()))?;

    let records = storage.load_pages(batch_id)?;

    // Sessions interrupted before finishing have no stored stats
    let stats = match storage.load_session_stats(batch_id)? {
        Some(stats) => stats,
        None => {
            let mut stats = crate::stats::CrawlStats {
                total_pages_found: session.pages_found,
                pages_parsed: session.pages_crawled,
                ..Default::default()
            };
            for record in &records {
                stats.record_page(record);
            }
            stats
        }
    };

    Ok(CrawlReport {
        batch_id: session.batch_id,
        seed_url: session.seed_url,
        status: session.status,
        config_hash: Some(session.config_hash),
        stats,
        records,
    })
}
