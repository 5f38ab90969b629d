//! Storage module for persisting crawl data
//!
//! This module is the page sink used by the binary:
//! - SQLite database initialization and schema management
//! - Page record persistence with dedup-on-insert
//! - Session status, progress and final statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::record::SessionStatus;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Caller-defined keys stored alongside each page record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    pub batch_id: String,
    pub site_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl RecordKeys {
    /// Keys for a batch with no site or user association
    pub fn for_batch(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            site_id: None,
            user_id: None,
        }
    }
}

/// Represents a crawl session in the database
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: i64,
    pub batch_id: String,
    pub seed_url: String,
    pub config_hash: String,
    pub status: SessionStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub pages_found: u64,
    pub pages_crawled: u64,
    pub current_url: Option<String>,
    pub error_message: Option<String>,
}
