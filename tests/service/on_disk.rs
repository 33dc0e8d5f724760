use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;

use marketcache_rs::{
    CacheConfig, CacheFirst, Cached, EntityStore, FetchError, MarketCache, ProfileEntity,
    SqliteStore,
};

use crate::common::{StubFetcher, manual_clock, profile};

#[tokio::test]
async fn cached_rows_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let clock = manual_clock();

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let fetcher = StubFetcher::<ProfileEntity>::ok(profile("META", "Meta Platforms, Inc."));
        let cache = CacheFirst::<ProfileEntity>::new(
            store,
            fetcher,
            clock.clone(),
            TimeDelta::hours(24),
            Duration::from_secs(5),
        )
        .unwrap();
        cache.get(&"META".to_string()).await.unwrap();
    }

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let stored = EntityStore::<ProfileEntity>::read_latest(store.as_ref(), &"META".to_string())
        .await
        .unwrap();
    assert_eq!(stored.map(|p| p.company_name), Some("Meta Platforms, Inc.".to_string()));

    // a new process within max-age needs no provider
    let fetcher = StubFetcher::<ProfileEntity>::failing(FetchError::Connect("offline".to_string()));
    let cache = CacheFirst::<ProfileEntity>::new(
        store,
        fetcher.clone(),
        clock,
        TimeDelta::hours(24),
        Duration::from_secs(5),
    )
    .unwrap();
    assert!(matches!(cache.get(&"META".to_string()).await.unwrap(), Cached::Fresh(_)));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn from_config_without_news_key_reports_not_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::builder()
        .database_path(dir.path().join("market.db"))
        .build()
        .unwrap();
    let cache = MarketCache::from_config(config).unwrap();

    let got = cache.news("business", 5).await.unwrap();

    assert!(got.is_definitive_absence());
    assert_eq!(got.failure(), Some(&FetchError::NotConfigured("NEWS_API_KEY")));
    assert!(cache.health().await.is_healthy());
}
