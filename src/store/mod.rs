//! SQLite-backed cache store.
//!
//! One connection behind a mutex; every query runs on the blocking pool so async callers never
//! stall the runtime.

mod entities;
mod schema;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::analysis::InsightEntity;
use crate::core::{CacheError, EntityStore, StoreError};
use crate::news::NewsEntity;
use crate::profile::ProfileEntity;
use crate::quote::{Quote, QuoteEntity};

/// Everything the [`MarketCache`](crate::MarketCache) facade needs from a store.
#[async_trait]
pub trait MarketStore:
    EntityStore<QuoteEntity>
    + EntityStore<ProfileEntity>
    + EntityStore<NewsEntity>
    + EntityStore<InsightEntity>
    + fmt::Debug
    + 'static
{
    /// Cheapest possible round trip to the backing store.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Quote rows for `ticker` captured at or after `since`, oldest first.
    async fn quote_history(&self, ticker: &str, since: DateTime<Utc>) -> Result<Vec<Quote>, StoreError>;
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub quotes: u64,
    pub profiles: u64,
    pub news: u64,
    pub insights: u64,
}

/// The SQLite cache store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    label: Arc<str>,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.label).finish()
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the file cannot be opened or migrated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let label: Arc<str> = Arc::from(path.as_ref().display().to_string());
        let conn = Connection::open(path).map_err(StoreError::from)?;
        Self::from_connection(conn, label)
    }

    /// An in-memory database, mostly for tests.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::from_connection(conn, Arc::from(":memory:"))
    }

    fn from_connection(conn: Connection, label: Arc<str>) -> Result<Self, CacheError> {
        schema::migrate(&conn)?;
        tracing::debug!(path = %label, "store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            label,
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("connection lock poisoned: {e}")))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Deletes news fetched before `cutoff`. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the delete fails.
    pub async fn purge_news_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = cutoff.timestamp_millis();
        let n = self
            .with_conn(move |c| {
                let tx = c.transaction()?;
                let n = tx.execute("DELETE FROM news WHERE fetched_at < ?1", params![cutoff])?;
                tx.execute(
                    "DELETE FROM news_categories WHERE url NOT IN (SELECT url FROM news)",
                    [],
                )?;
                tx.commit()?;
                Ok(n)
            })
            .await?;
        tracing::info!(deleted = n, "purged old news");
        Ok(n)
    }

    /// Deletes quote rows captured before `cutoff`. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the delete fails.
    pub async fn purge_quotes_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = cutoff.timestamp_millis();
        let n = self
            .with_conn(move |c| {
                Ok(c.execute("DELETE FROM quotes WHERE captured_at < ?1", params![cutoff])?)
            })
            .await?;
        tracing::info!(deleted = n, "purged old quotes");
        Ok(n)
    }

    /// Row counts for every table.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if a count query fails.
    pub async fn row_counts(&self) -> Result<RowCounts, StoreError> {
        self.with_conn(|c| {
            let count = |table: &str| -> Result<u64, StoreError> {
                let n: i64 = c.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
                Ok(u64::try_from(n).unwrap_or(0))
            };
            Ok(RowCounts {
                quotes: count("quotes")?,
                profiles: count("company_profiles")?,
                news: count("news")?,
                insights: count("ai_insights")?,
            })
        })
        .await
    }
}

#[async_trait]
impl MarketStore for SqliteStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|c| {
            let one: i64 = c.query_row("SELECT 1", [], |r| r.get(0))?;
            if one == 1 {
                Ok(())
            } else {
                Err(StoreError::Corrupt(format!("ping returned {one}")))
            }
        })
        .await
    }

    async fn quote_history(&self, ticker: &str, since: DateTime<Utc>) -> Result<Vec<Quote>, StoreError> {
        let ticker = ticker.to_string();
        let since = since.timestamp_millis();
        self.with_conn(move |c| {
            let mut stmt = c.prepare(
                "SELECT ticker, price, change_percent, high, low, volume, captured_at
                 FROM quotes WHERE ticker = ?1 AND captured_at >= ?2
                 ORDER BY captured_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![ticker, since], entities::quote_row)?;
            rows.map(|r| r.map_err(StoreError::from).and_then(entities::finish_quote))
                .collect()
        })
        .await
    }
}

pub(crate) fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| StoreError::Corrupt(format!("timestamp {ms}")))
}
