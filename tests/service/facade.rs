use std::sync::Arc;

use chrono::TimeDelta;

use marketcache_rs::{
    CacheConfig, CacheError, CacheMode, Cached, FetchError, InsightEntity, MarketCache,
    NewsEntity, ProfileEntity, QuoteEntity, SqliteStore,
};

use crate::common::{StubFetcher, article, insight, manual_clock, profile, quote, t0};

struct Stubs {
    quotes: Arc<StubFetcher<QuoteEntity>>,
    profiles: Arc<StubFetcher<ProfileEntity>>,
    news: Arc<StubFetcher<NewsEntity>>,
    insights: Arc<StubFetcher<InsightEntity>>,
}

fn stubs() -> Stubs {
    Stubs {
        quotes: StubFetcher::ok(quote("AAPL", 190.0)),
        profiles: StubFetcher::ok(profile("META", "Meta Platforms, Inc.")),
        news: StubFetcher::ok(vec![
            article("https://news.example/1", "Stocks open higher"),
            article("https://news.example/2", "Treasury yields dip"),
        ]),
        insights: StubFetcher::ok(insight("daily", "Calm session.")),
    }
}

fn cache(stubs: &Stubs, clock: Arc<marketcache_rs::ManualClock>) -> MarketCache<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    MarketCache::builder(store)
        .config(CacheConfig::default())
        .clock(clock)
        .quote_fetcher(stubs.quotes.clone())
        .profile_fetcher(stubs.profiles.clone())
        .news_fetcher(stubs.news.clone())
        .insight_fetcher(stubs.insights.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn every_entity_kind_goes_through_the_cache() {
    let s = stubs();
    let cache = cache(&s, manual_clock());

    assert!(matches!(cache.quote("AAPL").await.unwrap(), Cached::Refreshed(_)));
    assert!(matches!(cache.quote("AAPL").await.unwrap(), Cached::Fresh(_)));
    assert!(matches!(cache.profile("META").await.unwrap(), Cached::Refreshed(_)));
    assert!(matches!(cache.profile("META").await.unwrap(), Cached::Fresh(_)));
    assert_eq!(cache.news("business", 10).await.unwrap().value().map(Vec::len), Some(2));
    assert!(matches!(cache.news("Business", 10).await.unwrap(), Cached::Fresh(_)));
    assert!(matches!(cache.insight("daily").await.unwrap(), Cached::Refreshed(_)));
    assert!(matches!(cache.insight("DAILY").await.unwrap(), Cached::Fresh(_)));

    assert_eq!(s.quotes.calls(), 1);
    assert_eq!(s.profiles.calls(), 1);
    assert_eq!(s.news.calls(), 1);
    assert_eq!(s.insights.calls(), 1);
}

#[tokio::test]
async fn batch_quotes_keep_input_order() {
    let s = stubs();
    let cache = cache(&s, manual_clock());

    let got = cache.quotes(&["AAPL", "MSFT", "SPY"]).await.unwrap();

    assert_eq!(got.len(), 3);
    assert!(got.iter().all(|c| matches!(c, Cached::Refreshed(_))));
    assert_eq!(s.quotes.calls(), 3);
}

#[tokio::test]
async fn blank_keys_and_zero_limits_are_rejected() {
    let s = stubs();
    let cache = cache(&s, manual_clock());

    assert!(matches!(cache.quote(" ").await, Err(CacheError::EmptyKey { .. })));
    assert!(matches!(cache.quotes(&["AAPL", ""]).await, Err(CacheError::EmptyKey { .. })));
    assert!(matches!(cache.news("business", 0).await, Err(CacheError::InvalidLimit(0))));
    assert!(matches!(cache.insight("").await, Err(CacheError::EmptyKey { .. })));
}

#[tokio::test]
async fn history_returns_rows_in_window_oldest_first() {
    let s = stubs();
    let clock = manual_clock();
    let cache = cache(&s, clock.clone());

    cache.quote("AAPL").await.unwrap();
    clock.advance(TimeDelta::days(2));
    s.quotes.set(Ok(quote("AAPL", 195.0)));
    cache.quote_with("AAPL", CacheMode::Refresh).await.unwrap();
    clock.advance(TimeDelta::days(2));
    s.quotes.set(Ok(quote("AAPL", 200.0)));
    cache.quote_with("AAPL", CacheMode::Refresh).await.unwrap();

    let week = cache.quote_history("aapl", 7).await.unwrap();
    let prices: Vec<f64> = week.iter().map(|q| q.price).collect();
    assert_eq!(prices, vec![190.0, 195.0, 200.0]);
    assert_eq!(week[0].captured_at, t0());

    let recent = cache.quote_history("AAPL", 3).await.unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn provider_outage_serves_stale_data_flagged() {
    let s = stubs();
    let clock = manual_clock();
    let cache = cache(&s, clock.clone());

    cache.profile("META").await.unwrap();
    clock.advance(TimeDelta::hours(25));
    s.profiles.set(Err(FetchError::Connect("connection refused".to_string())));

    let got = cache.profile("META").await.unwrap();
    assert!(got.is_stale());
    assert_eq!(got.value().map(|p| p.company_name.as_str()), Some("Meta Platforms, Inc."));
}
