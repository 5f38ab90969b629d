//! Per-URL fetch and extraction pipeline
//!
//! `fetch → parse_static → (escalate?) → parse_rendered → emit`
//!
//! Every failure on this path is captured in the returned record; nothing
//! here can abort the crawl.

use super::boilerplate::extract_body_text;
use super::extract::{extract_document, PageContent};
use super::fetcher::fetch_page;
use super::links::discover_links;
use super::politeness::Politeness;
use super::render::{render_html, Renderer};
use crate::record::{PageRecord, PageStatus, ParseMethod};
use reqwest::Client;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Shared resources every page of a crawl is processed with
#[derive(Clone)]
pub struct Pipeline {
    pub client: Client,
    pub renderer: Arc<dyn Renderer>,
    pub politeness: Politeness,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub min_word_count: usize,
}

/// The result of processing one URL
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub record: PageRecord,
    /// Absolute links found in the static DOM; empty when the page failed
    pub links: Vec<String>,
}

/// Owned result of a synchronous static parse
///
/// The parsed `Html` is not `Send`, so it never outlives this step.
struct StaticParse {
    content: PageContent,
    body_text: Option<String>,
    links: Vec<String>,
}

fn parse_static(html: &str, page_url: &Url) -> StaticParse {
    let document = Html::parse_document(html);
    StaticParse {
        content: extract_document(&document),
        body_text: extract_body_text(&document),
        links: discover_links(&document, page_url),
    }
}

fn parse_rendered(html: &str) -> (PageContent, Option<String>) {
    let document = Html::parse_document(html);
    (extract_document(&document), extract_body_text(&document))
}

impl Pipeline {
    /// Processes one canonical URL
    ///
    /// The worker slot is held from fetch dispatch until the record is
    /// built, render included.
    pub async fn process(&self, url: &str) -> PageOutcome {
        let _slot = self.politeness.acquire().await;

        tracing::debug!("Fetching {}", url);
        let page = match fetch_page(&self.client, url, self.fetch_timeout).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return failure(url, e.to_string());
            }
        };
        tracing::debug!(
            "Fetched {} (HTTP {}, {})",
            url,
            page.status_code,
            if page.content_type.is_empty() { "no content type" } else { page.content_type.as_str() }
        );

        // Links resolve against the final URL so redirects don't break
        // relative hrefs
        let base = match Url::parse(&page.final_url).or_else(|_| Url::parse(url)) {
            Ok(base) => base,
            Err(e) => return failure(url, format!("Invalid page URL {}: {}", url, e)),
        };
        let parsed = parse_static(&page.body, &base);

        if !parsed.content.needs_render(self.min_word_count) {
            return PageOutcome {
                record: self.build_record(url, parsed.content, parsed.body_text, ParseMethod::Static),
                links: parsed.links,
            };
        }

        tracing::debug!(
            "Escalating {} to rendered parse (title: {}, h1: {}, words: {})",
            url,
            parsed.content.title.is_some(),
            parsed.content.h1.is_some(),
            parsed.content.word_count()
        );

        match render_html(self.renderer.as_ref(), url, self.render_timeout).await {
            Ok(html) => {
                let (content, body_text) = parse_rendered(&html);
                PageOutcome {
                    record: self.build_record(url, content, body_text, ParseMethod::Rendered),
                    links: parsed.links,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to render {}: {}", url, e);
                failure(url, e.to_string())
            }
        }
    }

    fn build_record(
        &self,
        url: &str,
        content: PageContent,
        body_text: Option<String>,
        parse_method: ParseMethod,
    ) -> PageRecord {
        let full_text = content.full_text();
        let word_count = content.word_count();
        let status = if word_count < self.min_word_count {
            PageStatus::Partial
        } else {
            PageStatus::Success
        };

        PageRecord {
            url: url.to_string(),
            title: content.title,
            meta_description: content.meta_description,
            h1: content.h1,
            h2: content.h2,
            h3: content.h3,
            body_text,
            full_text,
            word_count,
            parse_method: Some(parse_method),
            status,
            error_message: None,
        }
    }
}

fn failure(url: &str, error: String) -> PageOutcome {
    PageOutcome {
        record: PageRecord::failed(url, error),
        links: Vec::new(),
    }
}
