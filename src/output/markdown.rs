//! Markdown crawl report generation
//!
//! This module generates human-readable markdown reports of a crawl,
//! including statistics, a per-page table and the failure list.

use crate::output::OutputResult;
use crate::record::{PageRecord, SessionStatus};
use crate::stats::CrawlStats;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Everything a report is rendered from
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub batch_id: String,
    pub seed_url: String,
    pub status: SessionStatus,
    pub config_hash: Option<String>,
    pub stats: CrawlStats,
    pub records: Vec<PageRecord>,
}

/// Generates a markdown report and writes it to disk
///
/// # Arguments
///
/// * `report` - The crawl report data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown report
/// * `Err(OutputError)` - Failed to write report
pub fn generate_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Table cells cannot hold pipes or newlines
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# SiteSift Crawl Report\n\n");

    md.push_str("## Session\n\n");
    md.push_str(&format!("- **Batch**: {}\n", report.batch_id));
    md.push_str(&format!("- **Seed**: {}\n", report.seed_url));
    md.push_str(&format!("- **Status**: {}\n", report.status));
    if let Some(started) = stats.started_at {
        md.push_str(&format!("- **Started**: {}\n", started.to_rfc3339()));
    }
    if let Some(finished) = stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
        md.push_str(&format!(
            "- **Duration**: {:.1} seconds\n",
            stats.elapsed_seconds
        ));
    }
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Statistics\n\n");
    md.push_str(&format!(
        "- **Total Pages Found**: {}\n",
        stats.total_pages_found
    ));
    md.push_str(&format!("- **Pages Parsed**: {}\n", stats.pages_parsed));
    md.push_str(&format!(
        "- **Successful Pages**: {}\n",
        stats.successful_pages
    ));
    md.push_str(&format!("- **Failed Pages**: {}\n", stats.failed_pages));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    if !report.records.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Title | Words | Method | Status |\n");
        md.push_str("|-----|-------|-------|--------|--------|\n");

        for record in &report.records {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&record.url),
                cell(record.title.as_deref().unwrap_or("")),
                record.word_count,
                record
                    .parse_method
                    .map(|m| m.to_db_string())
                    .unwrap_or("-"),
                record.status
            ));
        }
        md.push('\n');
    }

    if !stats.failed_urls.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");

        for failed in &stats.failed_urls {
            md.push_str(&format!(
                "| {} | {} |\n",
                cell(&failed.url),
                cell(&failed.error)
            ));
        }
        md.push('\n');
    }

    md
}
