//! marketcache-rs: cache-first synchronization of market data into a local store.
//!
//! Quotes, company profiles, financial news and AI commentary are served from SQLite when fresh,
//! refreshed from their providers when stale, and served stale (flagged) when a provider fails.
//! Concurrent refreshes of the same key share one provider call.
//!
//! Start with [`MarketCache::from_config`], or compose [`CacheFirst`] directly for a single
//! entity kind.

pub mod analysis;
pub mod core;
pub mod health;
pub mod market;
pub mod news;
pub mod profile;
pub mod quote;
pub mod service;
pub mod store;

pub use analysis::{Analysis, CompletionProvider, Insight, InsightEntity, RiskLevel, Sentiment};
pub use crate::core::{
    Backoff, CacheConfig, CacheConfigBuilder, CacheEntity, CacheError, CacheFirst, CacheMode,
    Cached, Clock, DEFAULT_TICKERS, EntityStore, FetchClass, FetchError, Fetcher, Freshness,
    HttpClient, HttpClientBuilder, InFlight, ManualClock, RetryConfig, StoreError, SystemClock,
    is_fresh,
};
pub use health::{HealthReport, HealthStatus};
pub use market::MarketDataProvider;
pub use news::{NewsArticle, NewsEntity, NewsProvider, NewsQuery};
pub use profile::{CompanyProfile, ProfileEntity};
pub use quote::{Quote, QuoteEntity};
pub use service::{MarketCache, MarketCacheBuilder};
pub use store::{MarketStore, RowCounts, SqliteStore};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`). Safe to call repeatedly.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
