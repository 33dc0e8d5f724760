use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;

use marketcache_rs::{CacheFirst, CacheMode, Cached, FetchError, QuoteEntity, SqliteStore};

use crate::common::{StubFetcher, manual_clock, quote};

#[tokio::test]
async fn refresh_mode_always_fetches() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let fetcher = StubFetcher::<QuoteEntity>::ok(quote("MSFT", 420.0));
    let cache = CacheFirst::<QuoteEntity>::new(
        store,
        fetcher.clone(),
        manual_clock(),
        TimeDelta::minutes(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let key = "MSFT".to_string();

    cache.get(&key).await.unwrap();
    let forced = cache
        .get_with(&key, CacheMode::Refresh, cache.max_age())
        .await
        .unwrap();

    assert!(matches!(forced, Cached::Refreshed(_)));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn allow_stale_serves_old_data_without_fetching() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let clock = manual_clock();
    let fetcher = StubFetcher::<QuoteEntity>::ok(quote("MSFT", 420.0));
    let cache = CacheFirst::<QuoteEntity>::new(
        store,
        fetcher.clone(),
        clock.clone(),
        TimeDelta::minutes(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let key = "MSFT".to_string();

    cache.get(&key).await.unwrap();
    clock.advance(TimeDelta::days(3));
    let got = cache
        .get_with(&key, CacheMode::AllowStale, cache.max_age())
        .await
        .unwrap();

    assert!(matches!(got, Cached::Stale { reason: None, .. }));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn allow_stale_fetches_when_nothing_is_cached() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let fetcher = StubFetcher::<QuoteEntity>::failing(FetchError::Connect("refused".to_string()));
    let cache = CacheFirst::<QuoteEntity>::new(
        store,
        fetcher.clone(),
        manual_clock(),
        TimeDelta::minutes(5),
        Duration::from_secs(5),
    )
    .unwrap();

    let got = cache
        .get_with(&"GOOGL".to_string(), CacheMode::AllowStale, TimeDelta::minutes(5))
        .await
        .unwrap();

    assert!(got.is_empty());
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn zero_max_age_is_only_fresh_at_the_same_instant() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let clock = manual_clock();
    let fetcher = StubFetcher::<QuoteEntity>::ok(quote("TSLA", 180.0));
    let cache = CacheFirst::<QuoteEntity>::new(
        store,
        fetcher.clone(),
        clock.clone(),
        TimeDelta::zero(),
        Duration::from_secs(5),
    )
    .unwrap();
    let key = "TSLA".to_string();

    cache.get(&key).await.unwrap();
    assert!(matches!(cache.get(&key).await.unwrap(), Cached::Fresh(_)));
    clock.advance(TimeDelta::milliseconds(1));
    assert!(matches!(cache.get(&key).await.unwrap(), Cached::Refreshed(_)));
    assert_eq!(fetcher.calls(), 2);
}
