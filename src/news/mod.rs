//! News collections keyed by category, deduplicated by URL.

pub(crate) mod api;
mod model;
pub(crate) mod wire;

pub use model::{NewsArticle, NewsQuery};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use crate::core::client::constants::DEFAULT_BASE_NEWS;
use crate::core::{CacheConfig, CacheEntity, CacheError, FetchError, Fetcher, HttpClient};

/// Binds news collections into the cache-first algorithm.
///
/// The collection's timestamp is the newest `fetched_at` among its articles.
#[derive(Debug, Clone, Copy)]
pub struct NewsEntity;

impl CacheEntity for NewsEntity {
    type Key = NewsQuery;
    type Value = Vec<NewsArticle>;

    const KIND: &'static str = "news";

    fn normalize_key(key: &NewsQuery) -> Result<NewsQuery, CacheError> {
        let category = key.category.trim().to_ascii_lowercase();
        if category.is_empty() {
            return Err(CacheError::EmptyKey { kind: Self::KIND });
        }
        if key.limit == 0 {
            return Err(CacheError::InvalidLimit(key.limit));
        }
        Ok(NewsQuery::new(category, key.limit))
    }

    fn timestamp(value: &Vec<NewsArticle>) -> Option<DateTime<Utc>> {
        value.iter().map(|a| a.fetched_at).max()
    }

    fn stamp(value: &mut Vec<NewsArticle>, now: DateTime<Utc>) {
        for a in value.iter_mut() {
            a.fetched_at = now;
        }
    }
}

/// Fetches top headlines from the news API.
#[derive(Debug, Clone)]
pub struct NewsProvider {
    client: HttpClient,
    base: Url,
    api_key: Option<String>,
    country: String,
}

impl NewsProvider {
    /// A provider against the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in endpoint URL fails to parse.
    pub fn new(client: HttpClient, api_key: Option<String>) -> Result<Self, CacheError> {
        Ok(Self {
            client,
            base: Url::parse(DEFAULT_BASE_NEWS)?,
            api_key,
            country: "us".to_string(),
        })
    }

    /// A provider using the endpoint, key and country in `config`.
    pub fn from_config(client: HttpClient, config: &CacheConfig) -> Self {
        Self {
            client,
            base: config.news_url.clone(),
            api_key: config.news_api_key.clone(),
            country: config.news_country.clone(),
        }
    }

    /// Overrides the API base (useful for tests).
    #[must_use]
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }
}

#[async_trait]
impl Fetcher<NewsEntity> for NewsProvider {
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>, FetchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("NEWS_API_KEY"))?;
        let articles = api::fetch_headlines(&self.client, &self.base, key, &self.country, query).await?;
        tracing::debug!(query = %query, count = articles.len(), "fetched headlines");
        Ok(articles)
    }
}
