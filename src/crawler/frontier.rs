//! Frontier and dedup tracking
//!
//! The frontier owns the FIFO queue of pending URLs together with the `seen`
//! and `processed` sets. Every candidate passes through [`Frontier::enqueue`],
//! which canonicalizes it and applies the site, resource-type and robots
//! filters before it can be queued.

use crate::robots::RobotsGate;
use crate::url::{is_non_html_resource, normalize_url, site_key_of};
use std::collections::{HashSet, VecDeque};

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the pending queue
    Admitted(String),
    /// Already enqueued at some point in this crawl
    AlreadySeen,
    /// Host differs from the crawl's root host
    OffSite,
    /// Points to a file type that is never HTML
    NonHtml,
    /// Blocked by robots.txt
    RobotsDenied,
    /// Could not be parsed or canonicalized
    Invalid(String),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// The crawl frontier
///
/// Invariants: a URL is appended to `pending` at most once (guarded by `seen`),
/// and `seen` is a superset of `processed`.
#[derive(Debug)]
pub struct Frontier {
    /// Root host (`host[:port]`) every admitted URL must share
    root_site: String,

    /// URLs waiting to be fetched, in discovery order
    pending: VecDeque<String>,

    /// Every URL ever admitted
    seen: HashSet<String>,

    /// URLs whose fetch has been attempted
    processed: HashSet<String>,

    robots: RobotsGate,
}

impl Frontier {
    /// Creates an empty frontier restricted to `root_site`
    pub fn new(root_site: impl Into<String>, robots: RobotsGate) -> Self {
        Self {
            root_site: root_site.into().to_lowercase(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
            processed: HashSet::new(),
            robots,
        }
    }

    /// Offers a URL to the frontier
    ///
    /// The URL is canonicalized first; all filters operate on the canonical
    /// form. Filters run cheapest first, so robots.txt is only consulted for
    /// unseen same-site HTML candidates.
    pub fn enqueue(&mut self, url: &str) -> Admission {
        let canonical = match normalize_url(url) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::trace!("Rejecting {}: {}", url, e);
                return Admission::Invalid(e.to_string());
            }
        };

        if self.seen.contains(&canonical) {
            return Admission::AlreadySeen;
        }

        if site_key_of(&canonical).as_deref() != Some(self.root_site.as_str()) {
            tracing::trace!("Rejecting off-site URL {}", canonical);
            return Admission::OffSite;
        }

        if is_non_html_resource(&canonical) {
            tracing::trace!("Rejecting non-HTML resource {}", canonical);
            return Admission::NonHtml;
        }

        if !self.robots.admits(&canonical) {
            return Admission::RobotsDenied;
        }

        tracing::trace!("Enqueued {}", canonical);
        self.seen.insert(canonical.clone());
        self.pending.push_back(canonical.clone());
        Admission::Admitted(canonical)
    }

    /// Pops up to `n` URLs from the front of the queue
    ///
    /// URLs already marked processed are skipped, so a URL is never returned
    /// twice.
    pub fn dequeue_batch(&mut self, n: usize) -> Vec<String> {
        let mut batch = Vec::with_capacity(n.min(self.pending.len()));
        while batch.len() < n {
            match self.pending.pop_front() {
                Some(url) if self.processed.contains(&url) => continue,
                Some(url) => batch.push(url),
                None => break,
            }
        }
        batch
    }

    /// Records that a URL's fetch has been attempted
    ///
    /// Idempotent. Returns true the first time a URL is marked.
    pub fn mark_processed(&mut self, url: &str) -> bool {
        if self.processed.contains(url) {
            return false;
        }
        // Keep seen ⊇ processed even for URLs that bypassed enqueue
        self.seen.insert(url.to_string());
        self.processed.insert(url.to_string())
    }

    pub fn is_processed(&self, url: &str) -> bool {
        self.processed.contains(url)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Pages attempted plus pages still waiting
    pub fn pages_found(&self) -> usize {
        self.processed.len() + self.pending.len()
    }

    /// Drops every pending URL, returning how many were discarded
    pub fn discard_pending(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        discarded
    }

    pub fn root_site(&self) -> &str {
        &self.root_site
    }
}
