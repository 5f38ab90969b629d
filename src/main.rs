//! SiteSift main entry point
//!
//! This is the command-line interface for the SiteSift crawl-and-extract engine.

use anyhow::{bail, Context};
use clap::Parser;
use futures::StreamExt;
use sitesift::config::{load_config_with_hash, Config};
use sitesift::output::{
    generate_markdown_report, load_report, print_statistics, CrawlReport,
};
use sitesift::storage::{open_storage, RecordKeys, SqliteStorage, Storage};
use sitesift::{normalize_url, CrawlSession, ProgressSink, SessionStatus};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::EnvFilter;

/// SiteSift: crawl one site and extract its text content
///
/// SiteSift crawls every same-site HTML page reachable from a seed URL,
/// extracts titles, headings and body text, and falls back to a headless
/// browser when static HTML yields too little content.
#[derive(Parser, Debug)]
#[command(name = "sitesift")]
#[command(version = "1.0.0")]
#[command(about = "A polite single-site crawl-and-extract engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to start crawling from
    #[arg(long, required_unless_present = "export_report")]
    seed: Option<String>,

    /// Batch identifier for this crawl (generated when omitted)
    #[arg(long)]
    batch: Option<String>,

    /// Site identifier stored with every result row
    #[arg(long)]
    site_id: Option<i64>,

    /// User identifier stored with every result row
    #[arg(long)]
    user_id: Option<i64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seed without crawling
    #[arg(long, conflicts_with = "export_report")]
    dry_run: bool,

    /// Generate the markdown report of a stored batch and exit
    #[arg(long, value_name = "BATCH", conflicts_with = "dry_run")]
    export_report: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if let Some(batch_id) = &cli.export_report {
        return handle_export_report(&config, batch_id);
    }

    let seed = match &cli.seed {
        Some(seed) => seed.clone(),
        None => bail!("--seed is required"),
    };

    if cli.dry_run {
        handle_dry_run(&config, &seed)
    } else {
        let keys = RecordKeys {
            batch_id: cli.batch.clone().unwrap_or_else(default_batch_id),
            site_id: cli.site_id,
            user_id: cli.user_id,
        };
        handle_crawl(config, config_hash, &seed, keys).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitesift=info,warn"),
            1 => EnvFilter::new("sitesift=debug,info"),
            2 => EnvFilter::new("sitesift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn default_batch_id() -> String {
    format!("crawl-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"))
}

/// Handles the --dry-run mode: validates config and seed
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    println!("=== SiteSift Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Render timeout: {}ms", config.crawler.render_timeout_ms);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Minimum word count: {}", config.crawler.min_word_count);
    println!("  Robots policy: {:?}", config.crawler.robots_policy);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    if let Some(executable) = &config.browser.executable {
        println!("  Executable: {}", executable);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Report: {}", config.output.report_path);

    let canonical = normalize_url(seed).context("Invalid seed URL")?;
    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", canonical);

    Ok(())
}

/// Handles the --export-report mode: writes the report of a stored batch
fn handle_export_report(config: &Config, batch_id: &str) -> anyhow::Result<()> {
    println!("=== Exporting Crawl Report ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.report_path);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))?;

    tracing::info!("Loading batch {} from database...", batch_id);
    let report = load_report(&storage, batch_id)?;

    generate_markdown_report(&report, Path::new(&config.output.report_path))?;
    println!("✓ Report exported to: {}", config.output.report_path);

    Ok(())
}

/// Mirrors session progress into the sessions table
struct StorageProgress {
    storage: Arc<Mutex<SqliteStorage>>,
    batch_id: String,
}

impl ProgressSink for StorageProgress {
    fn on_progress(&self, pages_found: usize, pages_crawled: usize, current_url: &str) {
        let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = storage.update_session_progress(
            &self.batch_id,
            pages_found as u64,
            pages_crawled as u64,
            current_url,
        ) {
            tracing::warn!("Failed to record progress: {}", e);
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    seed: &str,
    keys: RecordKeys,
) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let report_path = PathBuf::from(&config.output.report_path);

    let session = CrawlSession::new(seed, keys.batch_id.clone(), Arc::clone(&config))?;
    let seed_url = session.seed().to_string();

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    storage.create_session(&keys.batch_id, &seed_url, &config_hash)?;
    let storage = Arc::new(Mutex::new(storage));

    let session = session.with_progress(Arc::new(StorageProgress {
        storage: Arc::clone(&storage),
        batch_id: keys.batch_id.clone(),
    }));

    // Ctrl-C requests a cooperative stop; the current round still finishes
    let handle = session.handle();
    let stop_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current round");
            stop_handle.stop();
        }
    });

    tracing::info!("Starting crawl {} from {}", keys.batch_id, seed_url);

    let mut records = Vec::new();
    let mut stream = session.records();
    let mut fatal = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => {
                let mut storage = storage.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = storage.save_page(&record, &keys) {
                    tracing::error!("Failed to save {}: {}", record.url, e);
                }
                records.push(record);
            }
            Err(e) => {
                fatal = Some(e);
                break;
            }
        }
    }

    let status = handle.status();
    let stats = handle.stats();
    {
        let mut storage = storage.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(e) = &fatal {
            storage.update_session_status(&keys.batch_id, status, Some(&e.to_string()))?;
        }
        storage.finish_session(&keys.batch_id, status, &stats)?;
    }

    if let Some(e) = fatal {
        tracing::error!("Crawl failed: {}", e);
        return Err(e.into());
    }

    if status == SessionStatus::Stopped {
        tracing::info!("Crawl stopped by request");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    print_statistics(&stats, &records);

    let report = CrawlReport {
        batch_id: keys.batch_id,
        seed_url,
        status,
        config_hash: Some(config_hash),
        stats,
        records,
    };
    generate_markdown_report(&report, &report_path)?;
    println!("\n✓ Report written to: {}", report_path.display());

    Ok(())
}
