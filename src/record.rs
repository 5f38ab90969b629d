//! Page records and status enums
//!
//! A [`PageRecord`] is produced exactly once per crawled URL and never changes
//! after it is emitted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the page content was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    /// Parsed from the plain HTTP response body
    Static,
    /// Parsed from the DOM of a headless-browser render
    Rendered,
}

/// Outcome of processing a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Parsed with at least the minimum word count
    Success,
    /// Parsed, but below the minimum word count
    Partial,
    /// Fetch or render failed; see `error_message`
    Fail,
}

/// Lifecycle of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    InProgress,
    Stopped,
    Completed,
    Failed,
}

impl ParseMethod {
    /// Converts to the string stored in the database
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
        }
    }

    /// Parses the database string representation
    ///
    /// Returns None if the string doesn't match any known value.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "static" => Some(Self::Static),
            "rendered" => Some(Self::Rendered),
            _ => None,
        }
    }
}

impl fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl PageStatus {
    /// Converts to the string stored in the database
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Fail => "fail",
        }
    }

    /// Parses the database string representation
    ///
    /// Returns None if the string doesn't match any known value.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "partial" => Some(Self::Partial),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl SessionStatus {
    /// Converts to the string stored in the database
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::InProgress => "in_progress",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses the database string representation
    ///
    /// Returns None if the string doesn't match any known value.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(Self::Starting),
            "in_progress" => Some(Self::InProgress),
            "stopped" => Some(Self::Stopped),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true once the session can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// One crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical URL
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    /// Boilerplate-stripped plain text
    pub body_text: Option<String>,
    /// Block-tagged reconstruction of the document structure
    pub full_text: String,
    pub word_count: usize,
    /// `None` when the page failed before any parse completed
    pub parse_method: Option<ParseMethod>,
    pub status: PageStatus,
    /// Present only when `status` is [`PageStatus::Fail`]
    pub error_message: Option<String>,
}

impl PageRecord {
    /// Builds the record for a page whose fetch or render failed
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            meta_description: None,
            h1: None,
            h2: Vec::new(),
            h3: Vec::new(),
            body_text: None,
            full_text: String::new(),
            word_count: 0,
            parse_method: None,
            status: PageStatus::Fail,
            error_message: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == PageStatus::Fail
    }
}
