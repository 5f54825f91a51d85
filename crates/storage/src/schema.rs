/// Schema bootstrap statements, executed in order at startup. Everything
/// is `IF NOT EXISTS` so reconnecting to an existing file is a no-op.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS stocks (
        code        TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        market      TEXT NOT NULL,
        sector      TEXT,
        industry    TEXT,
        updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS recommendations (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        code            TEXT NOT NULL,
        name            TEXT NOT NULL,
        action          TEXT NOT NULL,
        composite_score REAL NOT NULL,
        reason          TEXT,
        entry_price     REAL,
        target_price    REAL,
        source          TEXT NOT NULL,
        detail_json     TEXT NOT NULL,
        session_date    TEXT NOT NULL,
        created_at      TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_recommendations_session
        ON recommendations (session_date, code)",
    "CREATE TABLE IF NOT EXISTS recommendation_outcomes (
        code          TEXT NOT NULL,
        session_date  TEXT NOT NULL,
        action        TEXT NOT NULL,
        entry_price   REAL,
        target_price  REAL,
        price_5d      REAL,
        return_5d     REAL,
        correct_5d    INTEGER,
        price_10d     REAL,
        return_10d    REAL,
        correct_10d   INTEGER,
        price_20d     REAL,
        return_20d    REAL,
        correct_20d   INTEGER,
        target_hit    INTEGER,
        updated_at    TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (code, session_date)
    )",
    "CREATE TABLE IF NOT EXISTS sentiment_cache (
        cache_key   TEXT PRIMARY KEY,
        payload     TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS analysis_history (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        code          TEXT NOT NULL,
        name          TEXT NOT NULL,
        analysis_json TEXT NOT NULL,
        created_at    TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_analysis_history_code
        ON analysis_history (code, created_at)",
];
