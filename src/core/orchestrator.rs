//! The cache-first read algorithm, shared by every entity kind.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;

use crate::core::clock::Clock;
use crate::core::dedup::InFlight;
use crate::core::entity::{CacheEntity, CacheMode, Cached, EntityStore, Fetcher};
use crate::core::freshness::validate_max_age;
use crate::core::{CacheError, FetchClass, FetchError};

/// Composes a store, a fetcher and a clock into cache-first reads for one entity kind.
///
/// A read tries the cache, refreshes through the provider when the cached value is missing or
/// stale, and falls back to stale data when the provider fails. Concurrent refreshes of the same
/// key share one provider call.
pub struct CacheFirst<E: CacheEntity> {
    store: Arc<dyn EntityStore<E>>,
    fetcher: Arc<dyn Fetcher<E>>,
    clock: Arc<dyn Clock>,
    max_age: TimeDelta,
    fetch_timeout: Duration,
    in_flight: InFlight<E::Key, E::Value>,
}

impl<E: CacheEntity> std::fmt::Debug for CacheFirst<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFirst")
            .field("kind", &E::KIND)
            .field("max_age", &self.max_age)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl<E: CacheEntity> CacheFirst<E> {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxAge`] for a negative `max_age`.
    pub fn new(
        store: Arc<dyn EntityStore<E>>,
        fetcher: Arc<dyn Fetcher<E>>,
        clock: Arc<dyn Clock>,
        max_age: TimeDelta,
        fetch_timeout: Duration,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            store,
            fetcher,
            clock,
            max_age: validate_max_age(E::KIND, max_age)?,
            fetch_timeout,
            in_flight: InFlight::new(),
        })
    }

    /// The configured max-age.
    pub const fn max_age(&self) -> TimeDelta {
        self.max_age
    }

    /// `true` while a refresh for `key` is running.
    pub fn is_refreshing(&self, key: &E::Key) -> bool {
        E::normalize_key(key).is_ok_and(|k| self.in_flight.is_pending(&k))
    }

    /// Cache-first read with the configured max-age.
    ///
    /// # Errors
    ///
    /// Only contract violations (an empty key) are errors. Provider and store failures degrade
    /// to [`Cached::Stale`] or [`Cached::Empty`].
    pub async fn get(&self, key: &E::Key) -> Result<Cached<E::Value>, CacheError> {
        self.get_with(key, CacheMode::Use, self.max_age).await
    }

    /// Cache-first read with an explicit mode and max-age.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] or [`CacheError::InvalidMaxAge`] on contract violations.
    pub async fn get_with(
        &self,
        key: &E::Key,
        mode: CacheMode,
        max_age: TimeDelta,
    ) -> Result<Cached<E::Value>, CacheError> {
        let max_age = validate_max_age(E::KIND, max_age)?;
        let key = E::normalize_key(key)?;

        match mode {
            CacheMode::Use => {
                let now = self.clock.now();
                match self.store.read_fresh(&key, max_age, now).await {
                    Ok(Some(value)) => {
                        tracing::debug!(kind = E::KIND, key = %key, "cache hit");
                        return Ok(Cached::Fresh(value));
                    }
                    Ok(None) => {
                        tracing::debug!(kind = E::KIND, key = %key, "cache miss or stale");
                    }
                    Err(e) => {
                        tracing::warn!(kind = E::KIND, key = %key, error = %e, "store unavailable on read; fetching");
                    }
                }
            }
            CacheMode::AllowStale => match self.store.read_stale(&key).await {
                Ok(Some(value)) => {
                    tracing::debug!(kind = E::KIND, key = %key, "serving cached value regardless of age");
                    return Ok(Cached::Stale {
                        value,
                        reason: None,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(kind = E::KIND, key = %key, error = %e, "store unavailable on read; fetching");
                }
            },
            CacheMode::Refresh => {}
        }

        match self.refresh(&key).await {
            Ok(value) => Ok(Cached::Refreshed(value)),
            Err(reason) => Ok(self.fall_back(&key, reason).await),
        }
    }

    async fn fall_back(&self, key: &E::Key, reason: FetchError) -> Cached<E::Value> {
        match reason.class() {
            FetchClass::Transient => {
                tracing::warn!(kind = E::KIND, key = %key, error = %reason, "transient fetch failure");
            }
            FetchClass::Permanent => {
                tracing::info!(kind = E::KIND, key = %key, error = %reason, "permanent fetch failure");
            }
        }

        match self.store.read_stale(key).await {
            Ok(Some(value)) => {
                tracing::warn!(kind = E::KIND, key = %key, "serving stale cached value");
                Cached::Stale {
                    value,
                    reason: Some(reason),
                }
            }
            Ok(None) => Cached::Empty {
                reason: Some(reason),
            },
            Err(e) => {
                tracing::warn!(kind = E::KIND, key = %key, error = %e, "store unavailable on fallback read");
                Cached::Empty {
                    reason: Some(reason),
                }
            }
        }
    }

    /// Fetches, stamps and stores a value, sharing the work with concurrent callers for `key`.
    async fn refresh(&self, key: &E::Key) -> Result<E::Value, FetchError> {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let clock = Arc::clone(&self.clock);
        let timeout = self.fetch_timeout;
        let owned = key.clone();

        self.in_flight
            .run(key.clone(), async move {
                let key = owned;
                tracing::debug!(kind = E::KIND, key = %key, "fetching from provider");
                let mut value = match tokio::time::timeout(timeout, fetcher.fetch(&key)).await {
                    Ok(fetched) => fetched?,
                    Err(_) => {
                        return Err(FetchError::Deadline {
                            kind: E::KIND,
                            key: key.to_string(),
                            after: timeout,
                        });
                    }
                };
                E::stamp(&mut value, clock.now());

                match store.upsert(&key, value.clone()).await {
                    Ok(stored) => Ok(stored),
                    Err(e) => {
                        tracing::warn!(kind = E::KIND, key = %key, error = %e, "store write failed; serving fetched value");
                        Ok(value)
                    }
                }
            })
            .await
    }
}
