//! Crawl session driver
//!
//! The driver owns the frontier and runs the crawl in rounds: dequeue up to
//! `max_workers` URLs, process them concurrently, then fold each finished
//! record back in (link discovery, stats, progress) and yield it before the
//! next round starts.

use super::fetcher::build_http_client;
use super::frontier::{Admission, Frontier};
use super::pipeline::{PageOutcome, Pipeline};
use super::politeness::{effective_delay, Politeness};
use super::render::{ChromiumRenderer, Renderer};
use crate::config::Config;
use crate::record::{PageRecord, SessionStatus};
use crate::robots::{fetch_robots, RobotsGate};
use crate::stats::CrawlStats;
use crate::url::{is_non_html_resource, normalize_url, site_key};
use crate::{Result, SiftError, UrlError};
use async_stream::stream;
use futures::future::join_all;
use futures::Stream;
use reqwest::Client;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

/// Lazy, single-pass sequence of page records
///
/// An `Err` item is only ever produced for a crawl-fatal error, and is always
/// the last item.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<PageRecord>> + Send>>;

/// Receives `(pages_found, pages_crawled, current_url)` after each page
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, pages_found: usize, pages_crawled: usize, current_url: &str);
}

/// Owner-side view of a running crawl
///
/// Cheap to clone; all clones observe the same session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    stop: Arc<AtomicBool>,
    stats: Arc<RwLock<CrawlStats>>,
    status: Arc<RwLock<SessionStatus>>,
    current_url: Arc<RwLock<Option<String>>>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RwLock::new(CrawlStats::default())),
            status: Arc::new(RwLock::new(SessionStatus::Starting)),
            current_url: Arc::new(RwLock::new(None)),
        }
    }

    /// Requests a cooperative stop
    ///
    /// Pages already in flight still complete and are yielded; nothing new is
    /// dispatched afterwards.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Snapshot of the statistics, partial until the crawl ends
    pub fn stats(&self) -> CrawlStats {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// URL of the most recently emitted page
    pub fn current_url(&self) -> Option<String> {
        self.current_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(&self, status: SessionStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn set_current_url(&self, url: &str) {
        *self
            .current_url
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
    }

    fn update_stats(&self, update: impl FnOnce(&mut CrawlStats)) {
        update(&mut self.stats.write().unwrap_or_else(PoisonError::into_inner));
    }
}

/// One crawl of one site, from a seed URL
pub struct CrawlSession {
    seed: Url,
    batch_id: String,
    config: Arc<Config>,
    client: Client,
    renderer: Option<Arc<dyn Renderer>>,
    progress: Option<Arc<dyn ProgressSink>>,
    handle: SessionHandle,
}

impl CrawlSession {
    /// Prepares a crawl
    ///
    /// Canonicalizes the seed and builds the shared HTTP client. The browser
    /// is launched lazily when the record stream is first polled.
    ///
    /// # Errors
    ///
    /// * `SiftError::UrlError` - The seed is not an absolute http(s) URL
    /// * `SiftError::SeedRejected` - The seed points to a non-HTML resource
    /// * `SiftError::HttpClient` - The HTTP client could not be built
    pub fn new(seed: &str, batch_id: impl Into<String>, config: Arc<Config>) -> Result<Self> {
        let canonical = normalize_url(seed)?;
        if is_non_html_resource(&canonical) {
            return Err(SiftError::SeedRejected {
                url: canonical,
                reason: "not an HTML resource".to_string(),
            });
        }
        let seed = Url::parse(&canonical).map_err(|e| UrlError::Parse(e.to_string()))?;

        let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout())
            .map_err(SiftError::HttpClient)?;

        Ok(Self {
            seed,
            batch_id: batch_id.into(),
            config,
            client,
            renderer: None,
            progress: None,
            handle: SessionHandle::new(),
        })
    }

    /// Uses the given renderer instead of launching Chromium
    ///
    /// An injected renderer is not shut down when the crawl ends.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Canonical seed URL
    pub fn seed(&self) -> &str {
        self.seed.as_str()
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Runs the crawl, yielding each page record as soon as its round ends
    pub fn records(self) -> RecordStream {
        let CrawlSession {
            seed,
            batch_id,
            config,
            client,
            renderer,
            progress,
            handle,
        } = self;

        Box::pin(stream! {
            handle.set_status(SessionStatus::InProgress);
            handle.update_stats(CrawlStats::start);
            tracing::info!("Starting crawl {} from {}", batch_id, seed);

            let owns_renderer = renderer.is_none();
            let renderer: Arc<dyn Renderer> = match renderer {
                Some(renderer) => renderer,
                None => match ChromiumRenderer::launch(&config.browser).await {
                    Ok(renderer) => Arc::new(renderer),
                    Err(e) => {
                        tracing::error!("Crawl {} failed: {}", batch_id, e);
                        handle.update_stats(|stats| stats.finish(0));
                        handle.set_status(SessionStatus::Failed);
                        yield Err(SiftError::Browser(e));
                        return;
                    }
                },
            };

            let robots = fetch_robots(&client, &seed).await;
            let gate = RobotsGate::new(
                robots,
                config.crawler.robots_policy,
                config.user_agent.crawler_name.as_str(),
            );
            let delay = effective_delay(config.crawler.request_delay(), gate.crawl_delay());
            if delay > config.crawler.request_delay() {
                tracing::info!("Using robots.txt crawl delay of {:?}", delay);
            }

            let max_workers = config.crawler.max_workers.max(1) as usize;
            let pipeline = Pipeline {
                client,
                renderer: Arc::clone(&renderer),
                politeness: Politeness::new(max_workers, delay),
                fetch_timeout: config.crawler.fetch_timeout(),
                render_timeout: config.crawler.render_timeout(),
                min_word_count: config.crawler.min_word_count,
            };

            let mut frontier = Frontier::new(site_key(&seed).unwrap_or_default(), gate);
            match frontier.enqueue(seed.as_str()) {
                Admission::Admitted(_) => {}
                rejected => tracing::warn!("Seed {} not admitted: {:?}", seed, rejected),
            }

            while frontier.has_pending() && !handle.is_stopped() {
                let batch = frontier.dequeue_batch(max_workers);
                for url in &batch {
                    frontier.mark_processed(url);
                }
                handle.update_stats(|stats| stats.pages_parsed += batch.len() as u64);
                tracing::debug!("Dispatching round of {} pages", batch.len());

                let outcomes = join_all(batch.iter().map(|url| pipeline.process(url))).await;

                for PageOutcome { record, links } in outcomes {
                    let admitted = links
                        .iter()
                        .filter(|link| frontier.enqueue(link).is_admitted())
                        .count();
                    tracing::trace!("{} new URLs from {}", admitted, record.url);

                    let found = frontier.pages_found();
                    let crawled = frontier.processed_len();
                    handle.update_stats(|stats| {
                        stats.record_page(&record);
                        stats.total_pages_found = found as u64;
                    });
                    handle.set_current_url(&record.url);

                    tracing::info!(
                        "Progress: {}/{} pages. Processing: {}",
                        crawled,
                        found,
                        record.url
                    );
                    if let Some(progress) = &progress {
                        progress.on_progress(found, crawled, &record.url);
                    }

                    yield Ok(record);

                    if handle.is_stopped() {
                        tracing::debug!("Stop requested, draining current round");
                    }
                }
            }

            let found = frontier.pages_found() as u64;
            let status = if handle.is_stopped() {
                let discarded = frontier.discard_pending();
                tracing::info!("Crawl {} stopped, {} pending URLs discarded", batch_id, discarded);
                SessionStatus::Stopped
            } else {
                SessionStatus::Completed
            };

            handle.update_stats(|stats| stats.finish(found));

            if owns_renderer {
                if let Err(e) = renderer.shutdown().await {
                    tracing::warn!("Failed to shut down browser: {}", e);
                }
            }

            handle.set_status(status);
            let stats = handle.stats();
            tracing::info!(
                "Crawl {} {}: {} parsed, {} succeeded, {} failed in {:.1}s",
                batch_id,
                status,
                stats.pages_parsed,
                stats.successful_pages,
                stats.failed_pages,
                stats.elapsed_seconds
            );
        })
    }
}
