//! Explicit configuration for the cache layer and its providers.

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use url::Url;

use crate::core::CacheError;
use crate::core::client::constants::{
    DEFAULT_BASE_COMPLETION, DEFAULT_BASE_NEWS, DEFAULT_BASE_QUOTE_API, DEFAULT_BASE_QUOTE_V7,
    DEFAULT_COMPLETION_MODEL,
};
use crate::core::freshness::validate_max_age;
use crate::core::retry::RetryConfig;

/// Tickers used when no list is configured.
pub const DEFAULT_TICKERS: [&str; 5] = ["AAPL", "MSFT", "GOOGL", "TSLA", "SPY"];

/// Everything the cache layer needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Max-age of the latest quote row.
    pub quote_max_age: TimeDelta,
    /// Max-age of a company profile.
    pub profile_max_age: TimeDelta,
    /// Max-age of a news collection.
    pub news_max_age: TimeDelta,
    /// Max-age of an AI insight.
    pub insight_max_age: TimeDelta,
    /// Upper bound on a single provider fetch, retries included.
    pub fetch_timeout: Duration,
    /// Retry policy for transient HTTP failures.
    pub retry: RetryConfig,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// v7 quote endpoint.
    pub quote_url: Url,
    /// quoteSummary endpoint base (ticker is appended).
    pub profile_url: Url,
    /// News API base.
    pub news_url: Url,
    /// Chat completion API base.
    pub completion_url: Url,
    /// News API key.
    pub news_api_key: Option<String>,
    /// Completion API key.
    pub completion_api_key: Option<String>,
    /// Completion model name.
    pub completion_model: String,
    /// Country filter for headline requests.
    pub news_country: String,
    /// Tickers summarized by the insight prompt.
    pub tickers: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quote_max_age: TimeDelta::minutes(5),
            profile_max_age: TimeDelta::hours(24),
            news_max_age: TimeDelta::minutes(60),
            insight_max_age: TimeDelta::hours(24),
            fetch_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            database_path: PathBuf::from("marketcache.db"),
            quote_url: parse_const(DEFAULT_BASE_QUOTE_V7),
            profile_url: parse_const(DEFAULT_BASE_QUOTE_API),
            news_url: parse_const(DEFAULT_BASE_NEWS),
            completion_url: parse_const(DEFAULT_BASE_COMPLETION),
            news_api_key: None,
            completion_api_key: None,
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            news_country: "us".to_string(),
            tickers: DEFAULT_TICKERS.iter().map(ToString::to_string).collect(),
        }
    }
}

#[allow(clippy::expect_used)]
fn parse_const(url: &str) -> Url {
    Url::parse(url).expect("built-in endpoint is a valid URL")
}

impl CacheConfig {
    /// Create a new builder seeded with the defaults.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder {
            cfg: Self::default(),
        }
    }

    /// Reads the configuration from environment variables, falling back to defaults.
    ///
    /// Interval variables are whole seconds. With the `dotenv` feature, a `.env` file in the
    /// working directory is loaded first.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] for unparsable values and [`CacheError::InvalidMaxAge`]
    /// for negative intervals.
    pub fn from_env() -> Result<Self, CacheError> {
        #[cfg(feature = "dotenv")]
        {
            let _ = dotenv::dotenv();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, CacheError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        let seconds = |key: &'static str| -> Result<Option<i64>, CacheError> {
            lookup(key)
                .map(|raw| {
                    raw.trim().parse::<i64>().map_err(|_| CacheError::Config {
                        key,
                        value: raw.clone(),
                    })
                })
                .transpose()
        };
        let interval = |key: &'static str| -> Result<Option<TimeDelta>, CacheError> {
            seconds(key)?
                .map(|s| {
                    TimeDelta::try_seconds(s).ok_or_else(|| CacheError::Config {
                        key,
                        value: s.to_string(),
                    })
                })
                .transpose()
        };
        let url = |key: &'static str| -> Result<Option<Url>, CacheError> {
            lookup(key)
                .map(|raw| {
                    Url::parse(raw.trim()).map_err(|_| CacheError::Config {
                        key,
                        value: raw.clone(),
                    })
                })
                .transpose()
        };
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(d) = interval("STOCK_REFRESH_INTERVAL")? {
            cfg.quote_max_age = d;
        }
        if let Some(d) = interval("PROFILE_REFRESH_INTERVAL")? {
            cfg.profile_max_age = d;
        }
        if let Some(d) = interval("NEWS_REFRESH_INTERVAL")? {
            cfg.news_max_age = d;
        }
        if let Some(d) = interval("AI_REFRESH_INTERVAL")? {
            cfg.insight_max_age = d;
        }
        if let Some(s) = seconds("FETCH_TIMEOUT")? {
            let secs = u64::try_from(s).map_err(|_| CacheError::Config {
                key: "FETCH_TIMEOUT",
                value: s.to_string(),
            })?;
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = text("DATABASE_PATH") {
            cfg.database_path = PathBuf::from(path);
        }
        if let Some(u) = url("MARKET_DATA_URL")? {
            cfg.quote_url = u;
        }
        if let Some(u) = url("PROFILE_DATA_URL")? {
            cfg.profile_url = u;
        }
        if let Some(u) = url("NEWS_API_URL")? {
            cfg.news_url = u;
        }
        if let Some(u) = url("AI_API_URL")? {
            cfg.completion_url = u;
        }
        cfg.news_api_key = text("NEWS_API_KEY");
        cfg.completion_api_key = text("OPENAI_API_KEY");
        if let Some(model) = text("OPENAI_MODEL") {
            cfg.completion_model = model;
        }
        if let Some(list) = text("DEFAULT_TICKERS") {
            cfg.tickers = list
                .split(',')
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the max-ages.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxAge`] for the first negative interval.
    pub fn validate(&self) -> Result<(), CacheError> {
        validate_max_age("quote", self.quote_max_age)?;
        validate_max_age("profile", self.profile_max_age)?;
        validate_max_age("news", self.news_max_age)?;
        validate_max_age("insight", self.insight_max_age)?;
        Ok(())
    }

    /// Names of missing credentials, for startup diagnostics.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.news_api_key.is_none() {
            missing.push("NEWS_API_KEY");
        }
        if self.completion_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        missing
    }
}

/* ----------------------- Builder ----------------------- */

/// Builder for [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    cfg: CacheConfig,
}

impl CacheConfigBuilder {
    /// Quote max-age.
    #[must_use]
    pub const fn quote_max_age(mut self, d: TimeDelta) -> Self {
        self.cfg.quote_max_age = d;
        self
    }

    /// Company profile max-age.
    #[must_use]
    pub const fn profile_max_age(mut self, d: TimeDelta) -> Self {
        self.cfg.profile_max_age = d;
        self
    }

    /// News collection max-age.
    #[must_use]
    pub const fn news_max_age(mut self, d: TimeDelta) -> Self {
        self.cfg.news_max_age = d;
        self
    }

    /// Insight max-age.
    #[must_use]
    pub const fn insight_max_age(mut self, d: TimeDelta) -> Self {
        self.cfg.insight_max_age = d;
        self
    }

    /// Per-fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(mut self, d: Duration) -> Self {
        self.cfg.fetch_timeout = d;
        self
    }

    /// Retry policy for transient HTTP failures.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.cfg.retry = retry;
        self
    }

    /// SQLite file path.
    #[must_use]
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cfg.database_path = path.into();
        self
    }

    /// Override the v7 quote endpoint.
    #[must_use]
    pub fn quote_url(mut self, url: Url) -> Self {
        self.cfg.quote_url = url;
        self
    }

    /// Override the quoteSummary base.
    #[must_use]
    pub fn profile_url(mut self, url: Url) -> Self {
        self.cfg.profile_url = url;
        self
    }

    /// Override the news API base.
    #[must_use]
    pub fn news_url(mut self, url: Url) -> Self {
        self.cfg.news_url = url;
        self
    }

    /// Override the completion API base.
    #[must_use]
    pub fn completion_url(mut self, url: Url) -> Self {
        self.cfg.completion_url = url;
        self
    }

    /// News API key.
    #[must_use]
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.cfg.news_api_key = Some(key.into());
        self
    }

    /// Completion API key.
    #[must_use]
    pub fn completion_api_key(mut self, key: impl Into<String>) -> Self {
        self.cfg.completion_api_key = Some(key.into());
        self
    }

    /// Completion model name.
    #[must_use]
    pub fn completion_model(mut self, model: impl Into<String>) -> Self {
        self.cfg.completion_model = model.into();
        self
    }

    /// Tickers summarized by the insight prompt.
    #[must_use]
    pub fn tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cfg.tickers = tickers.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxAge`] for a negative interval.
    pub fn build(self) -> Result<CacheConfig, CacheError> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
