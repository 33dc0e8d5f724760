//! quoteSummary v10 API path for profiles.

use chrono::Utc;
use url::Url;

use crate::core::{FetchError, HttpClient, net};
use crate::profile::model::CompanyProfile;
use crate::profile::wire::{V10Envelope, V10Result, from_raw, from_raw_u64_round};

const MODULES: &str = "assetProfile,price,summaryDetail";
const NOT_AVAILABLE: &str = "N/A";

pub(crate) async fn fetch_profile(
    client: &HttpClient,
    base: &Url,
    ticker: &str,
) -> Result<CompanyProfile, FetchError> {
    let mut url = base
        .join(ticker)
        .map_err(|e| FetchError::Malformed(format!("profile url for {ticker}: {e}")))?;
    url.query_pairs_mut().append_pair("modules", MODULES);

    let req = client
        .http()
        .get(url.clone())
        .header("accept", "application/json");
    let resp = client.send_with_retry(req).await?;
    let env: V10Envelope = net::get_json(resp, "profile_api").await?;

    let summary = env
        .quote_summary
        .ok_or_else(|| FetchError::Malformed("quoteSummary missing".into()))?;

    if let Some(err) = summary.error {
        let code = err.code.unwrap_or_default();
        if code.eq_ignore_ascii_case("Not Found") {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        let desc = err.description.unwrap_or_default();
        return Err(FetchError::Malformed(format!("quoteSummary error {code}: {desc}")));
    }

    let result = summary
        .result
        .and_then(|mut r| (!r.is_empty()).then(|| r.swap_remove(0)))
        .ok_or(FetchError::NotFound {
            url: url.to_string(),
        })?;

    normalize(ticker, result)
}

pub(crate) fn normalize(requested: &str, result: V10Result) -> Result<CompanyProfile, FetchError> {
    let price = result.price.unwrap_or_default();
    if let Some(symbol) = price.symbol.as_deref()
        && !symbol.eq_ignore_ascii_case(requested)
    {
        return Err(FetchError::SymbolMismatch {
            requested: requested.to_string(),
            returned: symbol.to_string(),
        });
    }

    let asset = result.asset_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();

    Ok(CompanyProfile {
        ticker: requested.to_ascii_uppercase(),
        company_name: text(price.long_name.or(price.short_name)),
        sector: text(asset.sector),
        industry: text(asset.industry),
        market_cap: from_raw_u64_round(detail.market_cap).unwrap_or(0),
        pe_ratio: from_raw(detail.trailing_pe)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        description: text(asset.long_business_summary),
        website: text(asset.website),
        last_updated: Utc::now(),
    })
}

fn text(v: Option<String>) -> String {
    v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
