//! Terminal statistics display

use crate::record::{PageStatus, ParseMethod};
use crate::stats::CrawlStats;
use crate::PageRecord;

/// Counts records by parse method and status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBreakdown {
    pub static_pages: u64,
    pub rendered_pages: u64,
    pub success: u64,
    pub partial: u64,
    pub failed: u64,
}

impl RecordBreakdown {
    pub fn from_records(records: &[PageRecord]) -> Self {
        let mut breakdown = Self::default();
        for record in records {
            match record.parse_method {
                Some(ParseMethod::Static) => breakdown.static_pages += 1,
                Some(ParseMethod::Rendered) => breakdown.rendered_pages += 1,
                None => {}
            }
            match record.status {
                PageStatus::Success => breakdown.success += 1,
                PageStatus::Partial => breakdown.partial += 1,
                PageStatus::Fail => breakdown.failed += 1,
            }
        }
        breakdown
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `records` - Records of the crawl, used for the status breakdown
pub fn print_statistics(stats: &CrawlStats, records: &[PageRecord]) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total pages found: {}", stats.total_pages_found);
    println!("  Pages parsed: {}", stats.pages_parsed);
    println!("  Successful pages: {}", stats.successful_pages);
    println!("  Failed pages: {}", stats.failed_pages);
    println!("  Elapsed: {:.1}s", stats.elapsed_seconds);
    println!();

    if !records.is_empty() {
        let breakdown = RecordBreakdown::from_records(records);
        println!("Pages by Status:");
        println!("  success: {}", breakdown.success);
        println!("  partial: {}", breakdown.partial);
        println!("  fail: {}", breakdown.failed);
        println!();

        println!("Pages by Parse Method:");
        println!("  static: {}", breakdown.static_pages);
        println!("  rendered: {}", breakdown.rendered_pages);
        println!();
    }

    if !stats.failed_urls.is_empty() {
        println!("Failed URLs ({}):", stats.failed_urls.len());
        for failed in &stats.failed_urls {
            println!("  - {} ({})", failed.url, failed.error);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        stats.success_rate(),
        stats.successful_pages,
        stats.pages_parsed
    );
}
