use chrono::Utc;
use url::Url;

use crate::core::{FetchError, HttpClient, net};
use crate::quote::model::Quote;
use crate::quote::wire::{V7Envelope, V7QuoteNode};

pub(crate) async fn fetch_quote(
    client: &HttpClient,
    base: &Url,
    ticker: &str,
) -> Result<Quote, FetchError> {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("symbols", ticker);

    let req = client
        .http()
        .get(url.clone())
        .header("accept", "application/json");
    let resp = client.send_with_retry(req).await?;
    let env: V7Envelope = net::get_json(resp, "quote_v7").await?;

    let response = env
        .quote_response
        .ok_or_else(|| FetchError::Malformed("quoteResponse missing".into()))?;
    if let Some(err) = response.error.filter(|e| !e.is_null()) {
        return Err(FetchError::Malformed(format!("quote error: {err}")));
    }

    let node = response
        .result
        .and_then(|mut nodes| (!nodes.is_empty()).then(|| nodes.swap_remove(0)))
        .ok_or(FetchError::NotFound {
            url: url.to_string(),
        })?;

    normalize(ticker, node)
}

/// Turns a provider node into a null-free [`Quote`].
///
/// High and low fall back to the price, volume to zero, and the percent change to zero when the
/// previous close is missing or not positive.
pub(crate) fn normalize(requested: &str, node: V7QuoteNode) -> Result<Quote, FetchError> {
    if let Some(symbol) = node.symbol.as_deref()
        && !symbol.eq_ignore_ascii_case(requested)
    {
        return Err(FetchError::SymbolMismatch {
            requested: requested.to_string(),
            returned: symbol.to_string(),
        });
    }

    let price = node
        .current_price
        .or(node.regular_market_price)
        .filter(|p| p.is_finite())
        .ok_or_else(|| FetchError::Malformed(format!("no price for {requested}")))?;

    let change_percent = match node.previous_close {
        Some(prev) if prev > 0.0 => (price - prev) / prev * 100.0,
        _ => 0.0,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let volume = node
        .volume
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.round() as u64);

    Ok(Quote {
        ticker: requested.to_ascii_uppercase(),
        price: round2(price),
        change_percent: round2(change_percent),
        high: round2(node.day_high.unwrap_or(price)),
        low: round2(node.day_low.unwrap_or(price)),
        volume,
        captured_at: Utc::now(),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
