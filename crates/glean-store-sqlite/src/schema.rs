//! SQL schema for the Glean SQLite store.
//!
//! Executed once at connection startup. The applied version is recorded in
//! `PRAGMA user_version`; future migrations will be gated on that number.

/// Version written by [`SCHEMA`].
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per summarization request. Only the worker mutates a row, and only
-- while status = 'processing'.
CREATE TABLE IF NOT EXISTS scrape_logs (
    log_id              TEXT PRIMARY KEY,
    created_at          TEXT NOT NULL,
    title               TEXT,
    user_id             TEXT NOT NULL,
    urls                TEXT NOT NULL,   -- JSON array of strings
    status              TEXT NOT NULL DEFAULT 'processing'
                        CHECK (status IN ('processing', 'completed', 'failed')),
    model               TEXT,
    summarized_markdown TEXT,
    structured_insights TEXT             -- JSON object or NULL
);

CREATE TABLE IF NOT EXISTS source_bundles (
    bundle_id   TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    urls        TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    kind        TEXT NOT NULL CHECK (kind IN ('file', 'text')),
    storage_id  TEXT,
    file_name   TEXT,
    file_size   INTEGER,
    content     TEXT
);

CREATE TABLE IF NOT EXISTS competitors (
    competitor_id   TEXT PRIMARY KEY,
    created_at      TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    name            TEXT NOT NULL,
    scan_frequency  TEXT NOT NULL CHECK (scan_frequency IN ('w', 'm')),
    last_scanned_on TEXT
);

-- Append-only. No foreign key: analyses outlive a deleted competitor.
CREATE TABLE IF NOT EXISTS competitor_analyses (
    analysis_id   TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    competitor_id TEXT NOT NULL,
    analysis      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS usage (
    user_id          TEXT NOT NULL,
    month            TEXT NOT NULL,   -- YYYY-MM
    summary_count    INTEGER NOT NULL DEFAULT 0,
    competitor_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, month)
);

CREATE TABLE IF NOT EXISTS user_settings (
    user_id       TEXT PRIMARY KEY,
    system_prompt TEXT,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS scrape_logs_user_idx     ON scrape_logs(user_id, created_at);
CREATE INDEX IF NOT EXISTS source_bundles_user_idx  ON source_bundles(user_id);
CREATE INDEX IF NOT EXISTS documents_user_idx       ON documents(user_id);
CREATE INDEX IF NOT EXISTS competitors_user_idx     ON competitors(user_id);
CREATE INDEX IF NOT EXISTS competitors_freq_idx     ON competitors(scan_frequency);
CREATE INDEX IF NOT EXISTS analyses_competitor_idx  ON competitor_analyses(competitor_id, created_at);

PRAGMA user_version = 1;
";
