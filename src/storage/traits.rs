//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{PageRecord, SessionStatus};
use crate::stats::CrawlStats;
use crate::storage::{RecordKeys, SessionRow};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Sessions are addressed by their batch ID. Page rows are deduplicated on
/// insert by `(url, word_count, batch_id, site_id, user_id)`.
pub trait Storage {
    // ===== Session Management =====

    /// Creates a session row in the `starting` state
    ///
    /// # Arguments
    ///
    /// * `batch_id` - Caller-chosen crawl identifier, unique per database
    /// * `seed_url` - Canonical seed URL
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The row ID of the new session
    fn create_session(
        &mut self,
        batch_id: &str,
        seed_url: &str,
        config_hash: &str,
    ) -> StorageResult<i64>;

    /// Gets a session by batch ID
    fn get_session(&self, batch_id: &str) -> StorageResult<Option<SessionRow>>;

    /// Records live progress counters
    fn update_session_progress(
        &mut self,
        batch_id: &str,
        pages_found: u64,
        pages_crawled: u64,
        current_url: &str,
    ) -> StorageResult<()>;

    /// Changes the session status, optionally recording an error
    fn update_session_status(
        &mut self,
        batch_id: &str,
        status: SessionStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Stores the final status and statistics of a session
    fn finish_session(
        &mut self,
        batch_id: &str,
        status: SessionStatus,
        stats: &CrawlStats,
    ) -> StorageResult<()>;

    /// Final statistics of a finished session
    fn load_session_stats(&self, batch_id: &str) -> StorageResult<Option<CrawlStats>>;

    // ===== Page Records =====

    /// Persists one page record
    ///
    /// # Returns
    ///
    /// `true` if a row was inserted, `false` if an identical key already
    /// existed
    fn save_page(&mut self, record: &PageRecord, keys: &RecordKeys) -> StorageResult<bool>;

    /// Counts stored pages for a batch
    fn count_pages(&self, batch_id: &str) -> StorageResult<u64>;

    /// Loads all stored pages for a batch in insertion order
    fn load_pages(&self, batch_id: &str) -> StorageResult<Vec<PageRecord>>;
}
