use std::time::Duration;

use rusqlite::Connection;

use crate::core::StoreError;

/// Timestamps are UTC epoch milliseconds.
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticker TEXT NOT NULL,
    price REAL NOT NULL,
    change_percent REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    volume INTEGER NOT NULL,
    captured_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_quotes_ticker_time ON quotes(ticker, captured_at DESC);

CREATE TABLE IF NOT EXISTS company_profiles (
    ticker TEXT PRIMARY KEY,
    company_name TEXT NOT NULL,
    sector TEXT NOT NULL,
    industry TEXT NOT NULL,
    market_cap INTEGER NOT NULL,
    pe_ratio REAL NOT NULL,
    description TEXT NOT NULL,
    website TEXT NOT NULL,
    last_updated INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    summary TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    source TEXT NOT NULL,
    published_at INTEGER NOT NULL,
    fetched_at INTEGER NOT NULL
);

-- fetched_at is when the category last received the article.
CREATE TABLE IF NOT EXISTS news_categories (
    url TEXT NOT NULL,
    category TEXT NOT NULL,
    fetched_at INTEGER NOT NULL,
    PRIMARY KEY (url, category)
);
CREATE INDEX IF NOT EXISTS idx_news_categories_time ON news_categories(category, fetched_at DESC);

CREATE TABLE IF NOT EXISTS ai_insights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    content TEXT NOT NULL,
    analysis TEXT NOT NULL,
    generated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_insights_kind_time ON ai_insights(kind, generated_at DESC);
";

pub(crate) fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
