//! The capability set an entity kind plugs into the cache-first algorithm.

use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::core::freshness::Freshness;
use crate::core::{CacheError, FetchClass, FetchError, StoreError};

/// Identity, timestamps and key rules of one cached entity kind.
pub trait CacheEntity: Send + Sync + 'static {
    /// Identity of a cached value (a ticker, a news query, an insight kind).
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    /// What a read returns: one record, or a collection for news.
    type Value: Clone + fmt::Debug + Send + Sync + 'static;

    /// Short name used in logs and errors.
    const KIND: &'static str;

    /// Normalizes a caller-supplied key, rejecting empty ones.
    fn normalize_key(key: &Self::Key) -> Result<Self::Key, CacheError>;

    /// The timestamp staleness is computed from. `None` means nothing usable is cached.
    fn timestamp(value: &Self::Value) -> Option<DateTime<Utc>>;

    /// Sets the cache timestamp on a freshly fetched value.
    fn stamp(value: &mut Self::Value, now: DateTime<Utc>);
}

/// Persistence operations the orchestrator needs for one entity kind.
///
/// A read failure is reported as `Err`, never folded into `Ok(None)`.
#[async_trait]
pub trait EntityStore<E: CacheEntity>: Send + Sync {
    /// Writes a fetched value and returns the view callers should see.
    ///
    /// Profiles replace the row for the ticker; quotes append a row; news inserts each article and
    /// silently ignores URLs that are already stored, then returns the re-read collection.
    async fn upsert(&self, key: &E::Key, value: E::Value) -> Result<E::Value, StoreError>;

    /// The newest cached value for `key`, regardless of age.
    async fn read_latest(&self, key: &E::Key) -> Result<Option<E::Value>, StoreError>;

    /// The cached value for `key` if it is within `max_age` of `now`, else `None`.
    async fn read_fresh(
        &self,
        key: &E::Key,
        max_age: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Option<E::Value>, StoreError> {
        Ok(self
            .read_latest(key)
            .await?
            .filter(|v| Freshness::evaluate(E::timestamp(v), max_age, now).is_fresh()))
    }

    /// Any cached value for `key`, used as the fallback when a refresh fails.
    async fn read_stale(&self, key: &E::Key) -> Result<Option<E::Value>, StoreError> {
        self.read_latest(key).await
    }
}

/// Calls an external provider for one entity and normalizes the result.
#[async_trait]
pub trait Fetcher<E: CacheEntity>: Send + Sync {
    /// Fetches the current value for `key`.
    async fn fetch(&self, key: &E::Key) -> Result<E::Value, FetchError>;
}

/// Defines how a read treats the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Serve fresh cached data; otherwise fetch, falling back to stale data on failure. (Default)
    #[default]
    Use,
    /// Always fetch, still falling back to stale data on failure.
    Refresh,
    /// Serve any cached value regardless of age; fetch only when nothing is cached.
    AllowStale,
}

/// Outcome of a cache-first read. Never an error: the worst case is [`Cached::Empty`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cached<T> {
    /// Served from the cache, within max-age.
    Fresh(T),
    /// Fetched from the provider and written to the cache.
    Refreshed(T),
    /// Served from the cache past its max-age.
    Stale {
        /// The cached value.
        value: T,
        /// Why the refresh failed; `None` when the caller asked for stale data.
        reason: Option<FetchError>,
    },
    /// No data anywhere.
    Empty {
        /// The fetch failure, if a fetch was attempted.
        reason: Option<FetchError>,
    },
}

impl<T> Cached<T> {
    /// The value, if any.
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Fresh(v) | Self::Refreshed(v) | Self::Stale { value: v, .. } => Some(v),
            Self::Empty { .. } => None,
        }
    }

    /// Consumes the outcome, returning the value if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Fresh(v) | Self::Refreshed(v) | Self::Stale { value: v, .. } => Some(v),
            Self::Empty { .. } => None,
        }
    }

    /// `true` when the value is past its max-age (the UI's stale badge).
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// `true` when there is nothing to show.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// `true` when the provider definitively does not have the entity and nothing is cached.
    pub fn is_definitive_absence(&self) -> bool {
        matches!(
            self,
            Self::Empty { reason: Some(e) } if e.class() == FetchClass::Permanent
        )
    }

    /// The fetch failure behind a stale or empty outcome.
    pub const fn failure(&self) -> Option<&FetchError> {
        match self {
            Self::Stale { reason, .. } | Self::Empty { reason } => reason.as_ref(),
            Self::Fresh(_) | Self::Refreshed(_) => None,
        }
    }

    /// Maps the contained value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Cached<U> {
        match self {
            Self::Fresh(v) => Cached::Fresh(f(v)),
            Self::Refreshed(v) => Cached::Refreshed(f(v)),
            Self::Stale { value, reason } => Cached::Stale {
                value: f(value),
                reason,
            },
            Self::Empty { reason } => Cached::Empty { reason },
        }
    }
}

/// Rejects blank keys, returning the trimmed, upper-cased ticker.
pub(crate) fn normalize_ticker(kind: &'static str, ticker: &str) -> Result<String, CacheError> {
    let t = ticker.trim();
    if t.is_empty() {
        return Err(CacheError::EmptyKey { kind });
    }
    Ok(t.to_ascii_uppercase())
}
