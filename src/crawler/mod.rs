//! Crawler module for page fetching and extraction
//!
//! This module contains the core crawl-and-extract engine:
//! - Frontier and dedup tracking
//! - Politeness delay and concurrency ceiling
//! - HTTP fetching and static extraction
//! - Headless-browser fallback rendering
//! - Link discovery
//! - The session driver that streams page records

mod boilerplate;
mod extract;
mod fetcher;
mod frontier;
mod links;
mod pipeline;
mod politeness;
mod render;
mod session;

pub use boilerplate::extract_body_text;
pub use extract::{extract_content, extract_document, ContentBlock, PageContent};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use frontier::{Admission, Frontier};
pub use links::discover_links;
pub use pipeline::{PageOutcome, Pipeline};
pub use politeness::{effective_delay, DispatchSlot, Politeness};
pub use render::{render_html, ChromiumRenderer, RenderError, RenderTab, Renderer};
pub use session::{CrawlSession, ProgressSink, RecordStream, SessionHandle};
