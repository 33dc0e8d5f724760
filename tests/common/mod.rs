#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use httpmock::{Method::GET, Mock, MockServer};
use url::Url;

use marketcache_rs::{
    Analysis, CacheEntity, CompanyProfile, EntityStore, FetchError, Fetcher, HttpClient, Insight,
    InsightEntity, ManualClock, MarketStore, NewsArticle, NewsEntity, NewsQuery, ProfileEntity,
    Quote, QuoteEntity, RiskLevel, Sentiment, StoreError,
};

pub async fn setup_server() -> MockServer {
    MockServer::start_async().await
}

pub fn url(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.base_url(), path)).unwrap()
}

pub fn no_retry_client() -> HttpClient {
    HttpClient::builder().retry_enabled(false).build().unwrap()
}

pub fn mock_quote_v7<'a>(server: &'a MockServer, symbol: &'a str, body: &'a str) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/v7/finance/quote")
            .query_param("symbols", symbol);
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

/* ----------------------------- time ----------------------------- */

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

/* --------------------------- records ---------------------------- */

pub fn quote(ticker: &str, price: f64) -> Quote {
    Quote {
        ticker: ticker.to_string(),
        price,
        change_percent: 0.5,
        high: price + 1.0,
        low: price - 1.0,
        volume: 1_000,
        captured_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

pub fn profile(ticker: &str, name: &str) -> CompanyProfile {
    CompanyProfile {
        ticker: ticker.to_string(),
        company_name: name.to_string(),
        sector: "Communication Services".to_string(),
        industry: "Internet Content & Information".to_string(),
        market_cap: 1_200_000_000_000,
        pe_ratio: 27.4,
        description: "N/A".to_string(),
        website: "N/A".to_string(),
        last_updated: DateTime::<Utc>::UNIX_EPOCH,
    }
}

pub fn article(url: &str, title: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        summary: String::new(),
        url: url.to_string(),
        source: "Wire".to_string(),
        published_at: t0(),
        fetched_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

pub fn insight(kind: &str, content: &str) -> Insight {
    Insight {
        kind: kind.to_string(),
        content: content.to_string(),
        analysis: Analysis {
            sentiment: Sentiment::Neutral,
            key_factors: vec!["rates".to_string()],
            risk_level: RiskLevel::Medium,
        },
        generated_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

/* --------------------------- fetchers --------------------------- */

/// Returns a configurable outcome and counts calls.
pub struct StubFetcher<E: CacheEntity> {
    outcome: Mutex<Result<E::Value, FetchError>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl<E: CacheEntity> StubFetcher<E> {
    pub fn ok(value: E::Value) -> Arc<Self> {
        Self::with(Ok(value), Duration::ZERO)
    }

    pub fn failing(err: FetchError) -> Arc<Self> {
        Self::with(Err(err), Duration::ZERO)
    }

    pub fn with(outcome: Result<E::Value, FetchError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn set(&self, outcome: Result<E::Value, FetchError>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: CacheEntity> Fetcher<E> for StubFetcher<E> {
    async fn fetch(&self, _key: &E::Key) -> Result<E::Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.lock().unwrap().clone()
    }
}

/* ---------------------------- stores ---------------------------- */

/// A store whose every call fails, as if the database were down.
#[derive(Debug, Default)]
pub struct FailingStore;

fn down() -> StoreError {
    StoreError::Unavailable("database is down".to_string())
}

#[async_trait]
impl EntityStore<QuoteEntity> for FailingStore {
    async fn upsert(&self, _: &String, _: Quote) -> Result<Quote, StoreError> {
        Err(down())
    }
    async fn read_latest(&self, _: &String) -> Result<Option<Quote>, StoreError> {
        Err(down())
    }
}

#[async_trait]
impl EntityStore<ProfileEntity> for FailingStore {
    async fn upsert(&self, _: &String, _: CompanyProfile) -> Result<CompanyProfile, StoreError> {
        Err(down())
    }
    async fn read_latest(&self, _: &String) -> Result<Option<CompanyProfile>, StoreError> {
        Err(down())
    }
}

#[async_trait]
impl EntityStore<NewsEntity> for FailingStore {
    async fn upsert(&self, _: &NewsQuery, _: Vec<NewsArticle>) -> Result<Vec<NewsArticle>, StoreError> {
        Err(down())
    }
    async fn read_latest(&self, _: &NewsQuery) -> Result<Option<Vec<NewsArticle>>, StoreError> {
        Err(down())
    }
}

#[async_trait]
impl EntityStore<InsightEntity> for FailingStore {
    async fn upsert(&self, _: &String, _: Insight) -> Result<Insight, StoreError> {
        Err(down())
    }
    async fn read_latest(&self, _: &String) -> Result<Option<Insight>, StoreError> {
        Err(down())
    }
}

#[async_trait]
impl MarketStore for FailingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Err(down())
    }

    async fn quote_history(&self, _: &str, _: DateTime<Utc>) -> Result<Vec<Quote>, StoreError> {
        Err(down())
    }
}
