//! The market data provider: quotes and company profiles from the quote APIs.

use async_trait::async_trait;
use url::Url;

use crate::core::client::constants::{DEFAULT_BASE_QUOTE_API, DEFAULT_BASE_QUOTE_V7};
use crate::core::{CacheConfig, CacheError, FetchError, Fetcher, HttpClient};
use crate::profile::{CompanyProfile, ProfileEntity, api as profile_api};
use crate::quote::{Quote, QuoteEntity, api as quote_api};

/// Fetches quotes and profiles for a ticker.
#[derive(Debug, Clone)]
pub struct MarketDataProvider {
    client: HttpClient,
    quote_url: Url,
    profile_url: Url,
}

impl MarketDataProvider {
    /// Creates a provider against the default public endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in endpoint URLs fail to parse.
    pub fn new(client: HttpClient) -> Result<Self, CacheError> {
        Ok(Self {
            client,
            quote_url: Url::parse(DEFAULT_BASE_QUOTE_V7)?,
            profile_url: Url::parse(DEFAULT_BASE_QUOTE_API)?,
        })
    }

    /// Creates a provider using the endpoints in `config`.
    pub fn from_config(client: HttpClient, config: &CacheConfig) -> Self {
        Self {
            client,
            quote_url: config.quote_url.clone(),
            profile_url: config.profile_url.clone(),
        }
    }

    /// Overrides the quote endpoint (useful for tests).
    #[must_use]
    pub fn with_quote_url(mut self, url: Url) -> Self {
        self.quote_url = url;
        self
    }

    /// Overrides the profile endpoint (useful for tests).
    #[must_use]
    pub fn with_profile_url(mut self, url: Url) -> Self {
        self.profile_url = url;
        self
    }
}

#[async_trait]
impl Fetcher<QuoteEntity> for MarketDataProvider {
    async fn fetch(&self, ticker: &String) -> Result<Quote, FetchError> {
        quote_api::fetch_quote(&self.client, &self.quote_url, ticker).await
    }
}

#[async_trait]
impl Fetcher<ProfileEntity> for MarketDataProvider {
    async fn fetch(&self, ticker: &String) -> Result<CompanyProfile, FetchError> {
        profile_api::fetch_profile(&self.client, &self.profile_url, ticker).await
    }
}
