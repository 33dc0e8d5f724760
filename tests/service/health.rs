use std::sync::Arc;

use marketcache_rs::{HealthStatus, MarketCache, QuoteEntity, SqliteStore};

use crate::common::{FailingStore, StubFetcher, manual_clock, quote, t0};

#[tokio::test]
async fn healthy_store_reports_connected() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let fetcher = StubFetcher::<QuoteEntity>::ok(quote("AAPL", 1.0));
    let cache = MarketCache::builder(store)
        .clock(manual_clock())
        .quote_fetcher(fetcher.clone())
        .build()
        .unwrap();

    let report = cache.health().await;

    assert!(report.is_healthy());
    assert!(report.store_connected);
    assert_eq!(report.error, None);
    assert_eq!(report.checked_at, t0());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn failing_store_reports_unhealthy_and_reads_still_work() {
    let fetcher = StubFetcher::<QuoteEntity>::ok(quote("AAPL", 1.0));
    let cache = MarketCache::builder(Arc::new(FailingStore))
        .clock(manual_clock())
        .quote_fetcher(fetcher.clone())
        .build()
        .unwrap();

    let report = cache.health().await;
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert!(!report.store_connected);
    assert!(report.error.unwrap().contains("database is down"));

    assert!(cache.quote("AAPL").await.unwrap().value().is_some());
    assert!(cache.quote_history("AAPL", 7).await.unwrap().is_empty());
    assert_eq!(fetcher.calls(), 1);
}
