//! AI market commentary built from cached quotes and headlines.

pub(crate) mod api;
mod model;
pub(crate) mod prompt;
mod wire;

pub use model::{Analysis, Insight, RiskLevel, Sentiment};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use crate::core::client::constants::{DEFAULT_BASE_COMPLETION, DEFAULT_COMPLETION_MODEL};
use crate::core::{
    CacheConfig, CacheEntity, CacheError, DEFAULT_TICKERS, EntityStore, FetchError, Fetcher,
    HttpClient,
};
use crate::news::{NewsEntity, NewsQuery};
use crate::quote::QuoteEntity;

/// Binds [`Insight`] into the cache-first algorithm, keyed by insight kind.
#[derive(Debug, Clone, Copy)]
pub struct InsightEntity;

impl CacheEntity for InsightEntity {
    type Key = String;
    type Value = Insight;

    const KIND: &'static str = "insight";

    fn normalize_key(key: &String) -> Result<String, CacheError> {
        let k = key.trim().to_ascii_lowercase();
        if k.is_empty() {
            return Err(CacheError::EmptyKey { kind: Self::KIND });
        }
        Ok(k)
    }

    fn timestamp(value: &Insight) -> Option<DateTime<Utc>> {
        Some(value.generated_at)
    }

    fn stamp(value: &mut Insight, now: DateTime<Utc>) {
        value.generated_at = now;
    }
}

/// Generates insights through a chat completion API.
///
/// The prompt context comes from whatever is cached: the newest quote per configured ticker and
/// the newest headlines. It never triggers provider fetches of its own.
pub struct CompletionProvider {
    client: HttpClient,
    base: Url,
    api_key: Option<String>,
    model: String,
    tickers: Vec<String>,
    news_query: NewsQuery,
    quotes: Arc<dyn EntityStore<QuoteEntity>>,
    news: Arc<dyn EntityStore<NewsEntity>>,
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("base", &self.base.as_str())
            .field("model", &self.model)
            .field("tickers", &self.tickers)
            .field("news_query", &self.news_query)
            .finish_non_exhaustive()
    }
}

impl CompletionProvider {
    /// A provider against the default endpoint, reading context from the given stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in endpoint URL fails to parse.
    pub fn new(
        client: HttpClient,
        api_key: Option<String>,
        quotes: Arc<dyn EntityStore<QuoteEntity>>,
        news: Arc<dyn EntityStore<NewsEntity>>,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            client,
            base: Url::parse(DEFAULT_BASE_COMPLETION)?,
            api_key,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            tickers: DEFAULT_TICKERS.iter().map(ToString::to_string).collect(),
            news_query: NewsQuery::default(),
            quotes,
            news,
        })
    }

    /// A provider using the endpoint, credentials, model and tickers in `config`.
    pub fn from_config(
        client: HttpClient,
        config: &CacheConfig,
        quotes: Arc<dyn EntityStore<QuoteEntity>>,
        news: Arc<dyn EntityStore<NewsEntity>>,
    ) -> Self {
        let tickers = if config.tickers.is_empty() {
            DEFAULT_TICKERS.iter().map(ToString::to_string).collect()
        } else {
            config.tickers.clone()
        };
        Self {
            client,
            base: config.completion_url.clone(),
            api_key: config.completion_api_key.clone(),
            model: config.completion_model.clone(),
            tickers,
            news_query: NewsQuery::default(),
            quotes,
            news,
        }
    }

    /// Overrides the API base (useful for tests).
    #[must_use]
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    /// Sets the tickers summarized in the prompt.
    #[must_use]
    pub fn with_tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers = tickers.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the prompt from the cached context.
    pub async fn prompt(&self) -> String {
        let mut quotes = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            let key = ticker.trim().to_ascii_uppercase();
            match self.quotes.read_latest(&key).await {
                Ok(Some(q)) => quotes.push(q),
                Ok(None) => {}
                Err(e) => tracing::warn!(ticker = %key, error = %e, "quote context unavailable"),
            }
        }

        let news = match self.news.read_latest(&self.news_query).await {
            Ok(articles) => articles.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "news context unavailable");
                Vec::new()
            }
        };

        prompt::build_prompt(&quotes, &news)
    }
}

#[async_trait]
impl Fetcher<InsightEntity> for CompletionProvider {
    async fn fetch(&self, kind: &String) -> Result<Insight, FetchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("OPENAI_API_KEY"))?;

        let prompt = self.prompt().await;
        let content = api::complete(&self.client, &self.base, key, &self.model, &prompt).await?;
        let (content, analysis) = api::parse_completion(&content)?;
        tracing::debug!(kind = %kind, sentiment = ?analysis.sentiment, "generated insight");

        Ok(Insight {
            kind: kind.clone(),
            content,
            analysis,
            generated_at: Utc::now(),
        })
    }
}
