//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::{PageRecord, PageStatus, ParseMethod, SessionStatus};
use crate::stats::CrawlStats;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RecordKeys, SessionRow};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn require_session(&self, batch_id: &str) -> StorageResult<()> {
        if self.get_session(batch_id)?.is_none() {
            return Err(StorageError::SessionNotFound(batch_id.to_string()));
        }
        Ok(())
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        seed_url: row.get(2)?,
        config_hash: row.get(3)?,
        status: SessionStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(SessionStatus::Failed),
        started_at: row.get(5)?,
        finished_at: row.get(6)?,
        pages_found: row.get::<_, i64>(7)? as u64,
        pages_crawled: row.get::<_, i64>(8)? as u64,
        current_url: row.get(9)?,
        error_message: row.get(10)?,
    })
}

/// Raw page row; JSON columns are decoded outside the rusqlite closure
struct PageRow {
    url: String,
    title: Option<String>,
    meta_description: Option<String>,
    h1: Option<String>,
    h2: String,
    h3: String,
    body_text: Option<String>,
    full_text: String,
    word_count: i64,
    parse_method: Option<String>,
    status: String,
    error_message: Option<String>,
}

impl PageRow {
    fn into_record(self) -> StorageResult<PageRecord> {
        Ok(PageRecord {
            url: self.url,
            title: self.title,
            meta_description: self.meta_description,
            h1: self.h1,
            h2: serde_json::from_str(&self.h2)?,
            h3: serde_json::from_str(&self.h3)?,
            body_text: self.body_text,
            full_text: self.full_text,
            word_count: self.word_count.max(0) as usize,
            parse_method: self
                .parse_method
                .as_deref()
                .and_then(ParseMethod::from_db_string),
            status: PageStatus::from_db_string(&self.status).unwrap_or(PageStatus::Fail),
            error_message: self.error_message,
        })
    }
}

impl Storage for SqliteStorage {
    // ===== Session Management =====

    fn create_session(
        &mut self,
        batch_id: &str,
        seed_url: &str,
        config_hash: &str,
    ) -> StorageResult<i64> {
        if self.get_session(batch_id)?.is_some() {
            return Err(StorageError::DuplicateSession(batch_id.to_string()));
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_sessions (batch_id, seed_url, config_hash, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                batch_id,
                seed_url,
                config_hash,
                SessionStatus::Starting.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_session(&self, batch_id: &str) -> StorageResult<Option<SessionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, batch_id, seed_url, config_hash, status, started_at, finished_at,
                    pages_found, pages_crawled, current_url, error_message
             FROM crawl_sessions WHERE batch_id = ?1",
        )?;

        let session = stmt
            .query_row(params![batch_id], session_from_row)
            .optional()?;

        Ok(session)
    }

    fn update_session_progress(
        &mut self,
        batch_id: &str,
        pages_found: u64,
        pages_crawled: u64,
        current_url: &str,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE crawl_sessions SET pages_found = ?1, pages_crawled = ?2, current_url = ?3
             WHERE batch_id = ?4",
            params![pages_found as i64, pages_crawled as i64, current_url, batch_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SessionNotFound(batch_id.to_string()));
        }
        Ok(())
    }

    fn update_session_status(
        &mut self,
        batch_id: &str,
        status: SessionStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        self.require_session(batch_id)?;
        self.conn.execute(
            "UPDATE crawl_sessions SET status = ?1, error_message = COALESCE(?2, error_message)
             WHERE batch_id = ?3",
            params![status.to_db_string(), error_message, batch_id],
        )?;
        Ok(())
    }

    fn finish_session(
        &mut self,
        batch_id: &str,
        status: SessionStatus,
        stats: &CrawlStats,
    ) -> StorageResult<()> {
        self.require_session(batch_id)?;
        let stats_json = serde_json::to_string(stats)?;
        let finished_at = stats
            .finished_at
            .unwrap_or_else(Utc::now)
            .to_rfc3339();

        self.conn.execute(
            "UPDATE crawl_sessions
             SET status = ?1, finished_at = ?2, pages_found = ?3, pages_crawled = ?4,
                 stats_json = ?5
             WHERE batch_id = ?6",
            params![
                status.to_db_string(),
                finished_at,
                stats.total_pages_found as i64,
                stats.pages_parsed as i64,
                stats_json,
                batch_id
            ],
        )?;
        Ok(())
    }

    fn load_session_stats(&self, batch_id: &str) -> StorageResult<Option<CrawlStats>> {
        let stats_json: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT stats_json FROM crawl_sessions WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;

        match stats_json.flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // ===== Page Records =====

    fn save_page(&mut self, record: &PageRecord, keys: &RecordKeys) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO crawler_results
             (batch_id, site_id, user_id, page_url, title, meta_description, h1, h2, h3,
              body_text, full_text, word_count, parse_method, status, error_message, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                keys.batch_id,
                keys.site_id.unwrap_or(0),
                keys.user_id.unwrap_or(0),
                record.url,
                record.title,
                record.meta_description,
                record.h1,
                serde_json::to_string(&record.h2)?,
                serde_json::to_string(&record.h3)?,
                record.body_text,
                record.full_text,
                record.word_count as i64,
                record.parse_method.map(|m| m.to_db_string()),
                record.status.to_db_string(),
                record.error_message,
                now
            ],
        )?;

        if inserted == 0 {
            tracing::debug!("Skipped duplicate result for {}", record.url);
        }
        Ok(inserted > 0)
    }

    fn count_pages(&self, batch_id: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawler_results WHERE batch_id = ?1",
            params![batch_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn load_pages(&self, batch_id: &str) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_url, title, meta_description, h1, h2, h3, body_text, full_text,
                    word_count, parse_method, status, error_message
             FROM crawler_results WHERE batch_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![batch_id], |row| {
                Ok(PageRow {
                    url: row.get(0)?,
                    title: row.get(1)?,
                    meta_description: row.get(2)?,
                    h1: row.get(3)?,
                    h2: row.get(4)?,
                    h3: row.get(5)?,
                    body_text: row.get(6)?,
                    full_text: row.get(7)?,
                    word_count: row.get(8)?,
                    parse_method: row.get(9)?,
                    status: row.get(10)?,
                    error_message: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(PageRow::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::FailedUrl;

    fn record(url: &str, words: usize) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: Some("Home".to_string()),
            meta_description: Some("About us".to_string()),
            h1: Some("Welcome".to_string()),
            h2: vec!["Services".to_string(), "Team".to_string()],
            h3: vec![],
            body_text: Some("Body".to_string()),
            full_text: "[TITLE]Home[/TITLE]".to_string(),
            word_count: words,
            parse_method: Some(ParseMethod::Static),
            status: PageStatus::Success,
            error_message: None,
        }
    }

    fn storage_with_session(batch_id: &str) -> SqliteStorage {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .create_session(batch_id, "https://example.com/", "abc123")
            .unwrap();
        storage
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_session() {
        let storage = storage_with_session("b1");
        let session = storage.get_session("b1").unwrap().unwrap();

        assert!(session.id > 0);
        assert_eq!(session.seed_url, "https://example.com/");
        assert_eq!(session.config_hash, "abc123");
        assert_eq!(session.status, SessionStatus::Starting);
        assert!(session.finished_at.is_none());
    }

    #[test]
    fn test_duplicate_session_rejected() {
        let mut storage = storage_with_session("b1");
        let result = storage.create_session("b1", "https://example.com/", "x");
        assert!(matches!(result, Err(StorageError::DuplicateSession(_))));
    }

    #[test]
    fn test_missing_session() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_session("nope").unwrap().is_none());
        assert!(matches!(
            storage.update_session_status("nope", SessionStatus::Failed, None),
            Err(StorageError::SessionNotFound(_))
        ));
        assert!(matches!(
            storage.update_session_progress("nope", 1, 1, "https://example.com/"),
            Err(StorageError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_session_progress_and_status() {
        let mut storage = storage_with_session("b1");
        storage
            .update_session_status("b1", SessionStatus::InProgress, None)
            .unwrap();
        storage
            .update_session_progress("b1", 5, 2, "https://example.com/a")
            .unwrap();

        let session = storage.get_session("b1").unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.pages_found, 5);
        assert_eq!(session.pages_crawled, 2);
        assert_eq!(session.current_url.as_deref(), Some("https://example.com/a"));

        storage
            .update_session_status("b1", SessionStatus::Failed, Some("browser missing"))
            .unwrap();
        let session = storage.get_session("b1").unwrap().unwrap();
        assert_eq!(session.error_message.as_deref(), Some("browser missing"));
    }

    #[test]
    fn test_finish_session_stores_stats() {
        let mut storage = storage_with_session("b1");
        let mut stats = CrawlStats::default();
        stats.start();
        stats.pages_parsed = 3;
        stats.successful_pages = 2;
        stats.failed_pages = 1;
        stats.failed_urls.push(FailedUrl {
            url: "https://example.com/x".to_string(),
            error: "HTTP 500".to_string(),
        });
        stats.finish(4);

        storage
            .finish_session("b1", SessionStatus::Completed, &stats)
            .unwrap();

        let session = storage.get_session("b1").unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.finished_at.is_some());
        assert_eq!(session.pages_found, 4);
        assert_eq!(session.pages_crawled, 3);

        let loaded = storage.load_session_stats("b1").unwrap().unwrap();
        assert_eq!(loaded.started_at, stats.started_at);
        assert_eq!(loaded.finished_at, stats.finished_at);
        assert_eq!(loaded.pages_parsed, 3);
        assert_eq!(loaded.total_pages_found, 4);
        assert_eq!(loaded.failed_urls, stats.failed_urls);
    }

    #[test]
    fn test_stats_absent_before_finish() {
        let storage = storage_with_session("b1");
        assert!(storage.load_session_stats("b1").unwrap().is_none());
        assert!(storage.load_session_stats("other").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_page() {
        let mut storage = storage_with_session("b1");
        let original = record("https://example.com/", 120);
        assert!(storage
            .save_page(&original, &RecordKeys::for_batch("b1"))
            .unwrap());

        let pages = storage.load_pages("b1").unwrap();
        assert_eq!(pages, vec![original]);
    }

    #[test]
    fn test_save_page_dedups_on_keys() {
        let mut storage = storage_with_session("b1");
        let keys = RecordKeys::for_batch("b1");

        assert!(storage.save_page(&record("https://example.com/", 120), &keys).unwrap());
        assert!(!storage.save_page(&record("https://example.com/", 120), &keys).unwrap());

        // A different word count is a different row
        assert!(storage.save_page(&record("https://example.com/", 121), &keys).unwrap());

        // So is a different site
        let other_site = RecordKeys {
            site_id: Some(7),
            ..keys.clone()
        };
        assert!(storage
            .save_page(&record("https://example.com/", 120), &other_site)
            .unwrap());

        assert_eq!(storage.count_pages("b1").unwrap(), 3);
        assert_eq!(storage.count_pages("b2").unwrap(), 0);
    }

    #[test]
    fn test_failed_record_roundtrip() {
        let mut storage = storage_with_session("b1");
        let failed = PageRecord::failed("https://example.com/down", "Connection failed");
        storage
            .save_page(&failed, &RecordKeys::for_batch("b1"))
            .unwrap();

        let pages = storage.load_pages("b1").unwrap();
        assert_eq!(pages, vec![failed]);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitesift.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.create_session("b1", "https://example.com/", "h").unwrap();
            storage
                .save_page(&record("https://example.com/", 10), &RecordKeys::for_batch("b1"))
                .unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_pages("b1").unwrap(), 1);
        assert!(storage.get_session("b1").unwrap().is_some());
    }
}
