use std::time::Duration;

use httpmock::Method::GET;

use marketcache_rs::{
    Backoff, FetchClass, FetchError, Fetcher, HttpClient, MarketDataProvider, QuoteEntity,
    RetryConfig,
};

use crate::common::{mock_quote_v7, no_retry_client, setup_server, url};

fn provider(server: &httpmock::MockServer, client: HttpClient) -> MarketDataProvider {
    MarketDataProvider::new(client)
        .unwrap()
        .with_quote_url(url(server, "/v7/finance/quote"))
}

#[tokio::test]
async fn quote_is_normalized_from_v7_payload() {
    let server = setup_server().await;
    let mock = mock_quote_v7(
        &server,
        "AAPL",
        r#"{
          "quoteResponse": {
            "result": [{
              "symbol": "AAPL",
              "regularMarketPrice": 189.987,
              "regularMarketPreviousClose": 187.5,
              "regularMarketDayHigh": 190.32,
              "regularMarketVolume": 51234567
            }],
            "error": null
          }
        }"#,
    );

    let q = Fetcher::<QuoteEntity>::fetch(&provider(&server, no_retry_client()), &"AAPL".to_string())
        .await
        .unwrap();

    mock.assert();
    assert_eq!(q.ticker, "AAPL");
    assert!((q.price - 189.99).abs() < 1e-9);
    assert!((q.change_percent - 1.33).abs() < 1e-9);
    assert!((q.high - 190.32).abs() < 1e-9);
    // missing day low falls back to the price
    assert!((q.low - 189.99).abs() < 1e-9);
    assert_eq!(q.volume, 51_234_567);
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let server = setup_server().await;
    let _mock = mock_quote_v7(&server, "NOPE", r#"{"quoteResponse":{"result":[],"error":null}}"#);

    let err = Fetcher::<QuoteEntity>::fetch(&provider(&server, no_retry_client()), &"NOPE".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::NotFound { .. }));
    assert_eq!(err.class(), FetchClass::Permanent);
}

#[tokio::test]
async fn other_symbol_in_payload_is_rejected() {
    let server = setup_server().await;
    let _mock = mock_quote_v7(
        &server,
        "GOOGL",
        r#"{"quoteResponse":{"result":[{"symbol":"GOOG","regularMarketPrice":170.0}],"error":null}}"#,
    );

    let err = Fetcher::<QuoteEntity>::fetch(&provider(&server, no_retry_client()), &"GOOGL".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::SymbolMismatch { .. }));
}

#[tokio::test]
async fn statuses_map_to_failure_classes() {
    for (status, transient) in [(429, true), (503, true), (404, false), (400, false)] {
        let server = setup_server().await;
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/v7/finance/quote");
            then.status(status).body("nope");
        });

        let err = Fetcher::<QuoteEntity>::fetch(&provider(&server, no_retry_client()), &"AAPL".to_string())
            .await
            .unwrap_err();

        assert_eq!(err.is_transient(), transient, "status {status} gave {err:?}");
    }
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let server = setup_server().await;
    let _mock = mock_quote_v7(&server, "AAPL", "<html>maintenance</html>");

    let err = Fetcher::<QuoteEntity>::fetch(&provider(&server, no_retry_client()), &"AAPL".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Malformed(_)));
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = setup_server().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v7/finance/quote");
        then.status(503);
    });
    let client = HttpClient::builder()
        .retry_config(RetryConfig {
            max_retries: 2,
            backoff: Backoff::Fixed(Duration::from_millis(1)),
            ..RetryConfig::default()
        })
        .build()
        .unwrap();

    let err = Fetcher::<QuoteEntity>::fetch(&provider(&server, client), &"AAPL".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::ServerError { status: 503, .. }));
    mock.assert_calls(3);
}

#[tokio::test]
async fn client_without_retries_sends_once() {
    let server = setup_server().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v7/finance/quote");
        then.status(503);
    });

    let err = Fetcher::<QuoteEntity>::fetch(&provider(&server, no_retry_client()), &"AAPL".to_string())
        .await
        .unwrap_err();

    assert!(err.is_transient());
    mock.assert_calls(1);
}
