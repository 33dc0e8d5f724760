use std::sync::Arc;

use httpmock::Method::POST;

use marketcache_rs::{
    CompletionProvider, EntityStore, FetchError, Fetcher, InsightEntity, NewsEntity, NewsQuery,
    QuoteEntity, RiskLevel, Sentiment, SqliteStore,
};

use crate::common::{article, no_retry_client, quote, setup_server, t0, url};

async fn seeded_store() -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut q = quote("AAPL", 190.25);
    q.captured_at = t0();
    EntityStore::<QuoteEntity>::upsert(store.as_ref(), &"AAPL".to_string(), q)
        .await
        .unwrap();
    let mut a = article("https://news.example/chips", "Chip stocks rally");
    a.fetched_at = t0();
    EntityStore::<NewsEntity>::upsert(store.as_ref(), &NewsQuery::default(), vec![a])
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn prompt_uses_cached_quotes_and_headlines() {
    let store = seeded_store().await;
    let provider = CompletionProvider::new(no_retry_client(), Some("k".to_string()), store.clone(), store)
        .unwrap()
        .with_tickers(["AAPL", "MSFT"]);

    let prompt = provider.prompt().await;

    assert!(prompt.contains("AAPL: 190.25"));
    assert!(!prompt.contains("MSFT"));
    assert!(prompt.contains("- Chip stocks rally"));
}

#[tokio::test]
async fn completion_is_parsed_into_an_insight() {
    let server = setup_server().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer k");
        then.status(200).header("content-type", "application/json").body(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{\"summary\":\"Tech led gains.\",\"sentiment\":\"bullish\",\"key_factors\":[\"chips\",\"earnings\"],\"risk_level\":\"medium\"}"}}]}"#,
        );
    });
    let store = seeded_store().await;
    let provider = CompletionProvider::new(no_retry_client(), Some("k".to_string()), store.clone(), store)
        .unwrap()
        .with_base_url(url(&server, "/v1/"));

    let insight = Fetcher::<InsightEntity>::fetch(&provider, &"daily".to_string())
        .await
        .unwrap();

    mock.assert();
    assert_eq!(insight.kind, "daily");
    assert_eq!(insight.content, "Tech led gains.");
    assert_eq!(insight.analysis.sentiment, Sentiment::Bullish);
    assert_eq!(insight.analysis.risk_level, RiskLevel::Medium);
    assert_eq!(insight.analysis.key_factors, vec!["chips", "earnings"]);
}

#[tokio::test]
async fn missing_key_is_not_configured() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let provider = CompletionProvider::new(no_retry_client(), None, store.clone(), store).unwrap();

    let err = Fetcher::<InsightEntity>::fetch(&provider, &"daily".to_string())
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::NotConfigured("OPENAI_API_KEY"));
}
