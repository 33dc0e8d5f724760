use httpmock::Method::GET;

use marketcache_rs::{FetchError, Fetcher, NewsEntity, NewsProvider, NewsQuery};

use crate::common::{no_retry_client, setup_server, url};

#[tokio::test]
async fn headlines_are_normalized_and_incomplete_ones_dropped() {
    let server = setup_server().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/top-headlines")
            .query_param("category", "business")
            .query_param("pageSize", "5")
            .header("x-api-key", "test-key");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"status":"ok","totalResults":3,"articles":[
                    {"source":{"id":null,"name":"Reuters"},"title":"Fed holds rates","description":"Policy unchanged.","url":"https://news.example/fed","publishedAt":"2024-05-01T12:00:00Z"},
                    {"source":{"id":null,"name":null},"title":"Oil slips","description":null,"url":"https://news.example/oil","publishedAt":null},
                    {"source":{"name":"Blog"},"title":"[Removed]","description":"gone","url":null}
                ]}"#,
            );
    });
    let provider = NewsProvider::new(no_retry_client(), Some("test-key".to_string()))
        .unwrap()
        .with_base_url(url(&server, "/v2/"));

    let articles = Fetcher::<NewsEntity>::fetch(&provider, &NewsQuery::new("business", 5))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].source, "Reuters");
    assert_eq!(articles[0].ai_context(), "Fed holds rates. Policy unchanged.");
    assert_eq!(articles[1].summary, "");
    assert_eq!(articles[1].source, "Unknown");
    assert_eq!(articles[1].ai_context(), "Oil slips");
}

#[tokio::test]
async fn missing_key_fails_without_calling_the_api() {
    let server = setup_server().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v2/top-headlines");
        then.status(200).body(r#"{"status":"ok","articles":[]}"#);
    });
    let provider = NewsProvider::new(no_retry_client(), None)
        .unwrap()
        .with_base_url(url(&server, "/v2/"));

    let err = Fetcher::<NewsEntity>::fetch(&provider, &NewsQuery::default())
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::NotConfigured("NEWS_API_KEY"));
    mock.assert_calls(0);
}

#[tokio::test]
async fn error_envelope_is_reported() {
    let server = setup_server().await;
    let _mock = server.mock(|when, then| {
        when.method(GET).path("/v2/top-headlines");
        then.status(200).header("content-type", "application/json").body(
            r#"{"status":"error","code":"rateLimited","message":"You have made too many requests recently."}"#,
        );
    });
    let provider = NewsProvider::new(no_retry_client(), Some("k".to_string()))
        .unwrap()
        .with_base_url(url(&server, "/v2/"));

    let err = Fetcher::<NewsEntity>::fetch(&provider, &NewsQuery::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RateLimited { .. }));
}
