//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SiteSift database.

/// SQL schema for the database
///
/// `site_id` and `user_id` are stored as 0 when absent: SQLite treats NULLs
/// as distinct in UNIQUE constraints, which would defeat dedup-on-insert.
pub const SCHEMA_SQL: &str = r#"
-- Track crawl sessions
CREATE TABLE IF NOT EXISTS crawl_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id TEXT NOT NULL UNIQUE,
    seed_url TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    pages_found INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    current_url TEXT,
    error_message TEXT,
    stats_json TEXT
);

-- One row per emitted page record
CREATE TABLE IF NOT EXISTS crawler_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id TEXT NOT NULL,
    site_id INTEGER NOT NULL DEFAULT 0,
    user_id INTEGER NOT NULL DEFAULT 0,
    page_url TEXT NOT NULL,
    title TEXT,
    meta_description TEXT,
    h1 TEXT,
    h2 TEXT NOT NULL DEFAULT '[]',
    h3 TEXT NOT NULL DEFAULT '[]',
    body_text TEXT,
    full_text TEXT NOT NULL DEFAULT '',
    word_count INTEGER NOT NULL DEFAULT 0,
    parse_method TEXT,
    status TEXT NOT NULL,
    error_message TEXT,
    crawled_at TEXT NOT NULL,
    UNIQUE(page_url, word_count, batch_id, site_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_results_batch ON crawler_results(batch_id);
CREATE INDEX IF NOT EXISTS idx_results_status ON crawler_results(status);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
