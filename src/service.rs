//! The public facade: one cache-first orchestrator per entity kind over a shared store.

use std::sync::Arc;

use chrono::TimeDelta;
use futures::future::try_join_all;

use crate::analysis::{CompletionProvider, Insight, InsightEntity};
use crate::core::entity::normalize_ticker;
use crate::core::{
    CacheConfig, CacheError, CacheFirst, CacheMode, Cached, Clock, EntityStore, Fetcher,
    HttpClient, SystemClock,
};
use crate::health::HealthReport;
use crate::market::MarketDataProvider;
use crate::news::{NewsArticle, NewsEntity, NewsProvider, NewsQuery};
use crate::profile::{CompanyProfile, ProfileEntity};
use crate::quote::{Quote, QuoteEntity};
use crate::store::{MarketStore, SqliteStore};

/// Cache-first access to quotes, company profiles, news and AI insights.
///
/// ```no_run
/// # async fn run() -> Result<(), marketcache_rs::CacheError> {
/// let cache = marketcache_rs::MarketCache::from_config(marketcache_rs::CacheConfig::from_env()?)?;
/// let quote = cache.quote("AAPL").await?;
/// if let Some(q) = quote.value() {
///     println!("{} {} (stale: {})", q.ticker, q.price, quote.is_stale());
/// }
/// # Ok(())
/// # }
/// ```
pub struct MarketCache<S: MarketStore = SqliteStore> {
    config: CacheConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    quotes: CacheFirst<QuoteEntity>,
    profiles: CacheFirst<ProfileEntity>,
    news: CacheFirst<NewsEntity>,
    insights: CacheFirst<InsightEntity>,
}

impl<S: MarketStore> std::fmt::Debug for MarketCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketCache")
            .field("store", &self.store)
            .field("quotes", &self.quotes)
            .field("profiles", &self.profiles)
            .field("news", &self.news)
            .field("insights", &self.insights)
            .finish_non_exhaustive()
    }
}

impl MarketCache<SqliteStore> {
    /// Opens the SQLite store named in `config` and wires the default providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the HTTP client cannot be built, or a
    /// max-age is negative.
    pub fn from_config(config: CacheConfig) -> Result<Self, CacheError> {
        let store = Arc::new(SqliteStore::open(&config.database_path)?);
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            tracing::warn!(?missing, "credentials missing; affected providers will report NotConfigured");
        }
        MarketCacheBuilder::new(store).config(config).build()
    }
}

impl<S: MarketStore> MarketCache<S> {
    /// Starts a builder over `store`.
    pub fn builder(store: Arc<S>) -> MarketCacheBuilder<S> {
        MarketCacheBuilder::new(store)
    }

    /// The configuration in use.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The backing store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Latest quote for `ticker`, refreshed when older than the quote max-age.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank ticker.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn quote(&self, ticker: &str) -> Result<Cached<Quote>, CacheError> {
        self.quotes.get(&ticker.to_string()).await
    }

    /// Like [`MarketCache::quote`] with an explicit cache mode.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank ticker.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn quote_with(&self, ticker: &str, mode: CacheMode) -> Result<Cached<Quote>, CacheError> {
        self.quotes
            .get_with(&ticker.to_string(), mode, self.quotes.max_age())
            .await
    }

    /// Quotes for several tickers, concurrently, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] if any ticker is blank.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn quotes(&self, tickers: &[&str]) -> Result<Vec<Cached<Quote>>, CacheError> {
        try_join_all(tickers.iter().map(|t| self.quote(t))).await
    }

    /// Stored quote rows for `ticker` over the last `days` days, oldest first.
    ///
    /// Reads the store only. A store failure yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank ticker.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn quote_history(&self, ticker: &str, days: u32) -> Result<Vec<Quote>, CacheError> {
        let ticker = normalize_ticker("quote", ticker)?;
        let since = self.clock.now() - TimeDelta::days(i64::from(days));
        match self.store.quote_history(&ticker, since).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "store unavailable for quote history");
                Ok(Vec::new())
            }
        }
    }

    /// Company profile for `ticker`, refreshed when older than the profile max-age.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank ticker.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn profile(&self, ticker: &str) -> Result<Cached<CompanyProfile>, CacheError> {
        self.profiles.get(&ticker.to_string()).await
    }

    /// Like [`MarketCache::profile`] with an explicit cache mode.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank ticker.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn profile_with(
        &self,
        ticker: &str,
        mode: CacheMode,
    ) -> Result<Cached<CompanyProfile>, CacheError> {
        self.profiles
            .get_with(&ticker.to_string(), mode, self.profiles.max_age())
            .await
    }

    /// Up to `limit` articles for `category`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank category and [`CacheError::InvalidLimit`]
    /// for a zero limit.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn news(&self, category: &str, limit: u32) -> Result<Cached<Vec<NewsArticle>>, CacheError> {
        self.news.get(&NewsQuery::new(category, limit)).await
    }

    /// Like [`MarketCache::news`] with an explicit cache mode.
    ///
    /// # Errors
    ///
    /// Same as [`MarketCache::news`].
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn news_with(
        &self,
        category: &str,
        limit: u32,
        mode: CacheMode,
    ) -> Result<Cached<Vec<NewsArticle>>, CacheError> {
        self.news
            .get_with(&NewsQuery::new(category, limit), mode, self.news.max_age())
            .await
    }

    /// The AI insight of `kind` (e.g. `daily`), regenerated when older than the insight max-age.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyKey`] for a blank kind.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn insight(&self, kind: &str) -> Result<Cached<Insight>, CacheError> {
        self.insights.get(&kind.to_string()).await
    }

    /// Pings the store. Never contacts a provider.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn health(&self) -> HealthReport {
        let checked_at = self.clock.now();
        match self.store.ping().await {
            Ok(()) => HealthReport::healthy(checked_at),
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                HealthReport::unhealthy(e, checked_at)
            }
        }
    }
}

/* ----------------------- Builder ----------------------- */

/// Builder for [`MarketCache`]. Unset collaborators default to the HTTP providers and the
/// system clock.
pub struct MarketCacheBuilder<S: MarketStore> {
    store: Arc<S>,
    config: CacheConfig,
    clock: Option<Arc<dyn Clock>>,
    http: Option<HttpClient>,
    quotes: Option<Arc<dyn Fetcher<QuoteEntity>>>,
    profiles: Option<Arc<dyn Fetcher<ProfileEntity>>>,
    news: Option<Arc<dyn Fetcher<NewsEntity>>>,
    insights: Option<Arc<dyn Fetcher<InsightEntity>>>,
}

impl<S: MarketStore> MarketCacheBuilder<S> {
    fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: CacheConfig::default(),
            clock: None,
            http: None,
            quotes: None,
            profiles: None,
            news: None,
            insights: None,
        }
    }

    /// Use `config` for max-ages, timeouts, endpoints and credentials.
    #[must_use]
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source for freshness checks and stamping.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// HTTP client shared by the default providers.
    #[must_use]
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http = Some(client);
        self
    }

    /// Replace the quote fetcher.
    #[must_use]
    pub fn quote_fetcher(mut self, f: Arc<dyn Fetcher<QuoteEntity>>) -> Self {
        self.quotes = Some(f);
        self
    }

    /// Replace the profile fetcher.
    #[must_use]
    pub fn profile_fetcher(mut self, f: Arc<dyn Fetcher<ProfileEntity>>) -> Self {
        self.profiles = Some(f);
        self
    }

    /// Replace the news fetcher.
    #[must_use]
    pub fn news_fetcher(mut self, f: Arc<dyn Fetcher<NewsEntity>>) -> Self {
        self.news = Some(f);
        self
    }

    /// Replace the insight fetcher.
    #[must_use]
    pub fn insight_fetcher(mut self, f: Arc<dyn Fetcher<InsightEntity>>) -> Self {
        self.insights = Some(f);
        self
    }

    /// Builds the facade.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxAge`] for a negative max-age or [`CacheError::Http`] if
    /// the default HTTP client cannot be built.
    pub fn build(self) -> Result<MarketCache<S>, CacheError> {
        let cfg = self.config;
        cfg.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let http = match self.http {
            Some(c) => c,
            None => HttpClient::builder()
                .timeout(cfg.fetch_timeout)
                .retry_config(cfg.retry.clone())
                .build()?,
        };

        let quote_store: Arc<dyn EntityStore<QuoteEntity>> = self.store.clone();
        let profile_store: Arc<dyn EntityStore<ProfileEntity>> = self.store.clone();
        let news_store: Arc<dyn EntityStore<NewsEntity>> = self.store.clone();
        let insight_store: Arc<dyn EntityStore<InsightEntity>> = self.store.clone();

        let market = Arc::new(MarketDataProvider::from_config(http.clone(), &cfg));
        let quote_fetcher = self.quotes.unwrap_or_else(|| market.clone());
        let profile_fetcher = self.profiles.unwrap_or(market);
        let news_fetcher = self
            .news
            .unwrap_or_else(|| Arc::new(NewsProvider::from_config(http.clone(), &cfg)));
        let insight_fetcher = self.insights.unwrap_or_else(|| {
            Arc::new(CompletionProvider::from_config(
                http,
                &cfg,
                quote_store.clone(),
                news_store.clone(),
            ))
        });

        let timeout = cfg.fetch_timeout;
        Ok(MarketCache {
            quotes: CacheFirst::new(quote_store, quote_fetcher, clock.clone(), cfg.quote_max_age, timeout)?,
            profiles: CacheFirst::new(
                profile_store,
                profile_fetcher,
                clock.clone(),
                cfg.profile_max_age,
                timeout,
            )?,
            news: CacheFirst::new(news_store, news_fetcher, clock.clone(), cfg.news_max_age, timeout)?,
            // Completion calls are slower than data fetches.
            insights: CacheFirst::new(
                insight_store,
                insight_fetcher,
                clock.clone(),
                cfg.insight_max_age,
                timeout.saturating_mul(6),
            )?,
            config: cfg,
            store: self.store,
            clock,
        })
    }
}
