use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct V10Envelope {
    #[serde(rename = "quoteSummary")]
    pub(crate) quote_summary: Option<V10QuoteSummary>,
}

#[derive(Deserialize)]
pub(crate) struct V10QuoteSummary {
    pub(crate) result: Option<Vec<V10Result>>,
    pub(crate) error: Option<V10Error>,
}

#[derive(Deserialize)]
pub(crate) struct V10Error {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Deserialize, Default)]
pub(crate) struct V10Result {
    #[serde(rename = "assetProfile")]
    pub(crate) asset_profile: Option<V10AssetProfile>,
    pub(crate) price: Option<V10Price>,
    #[serde(rename = "summaryDetail")]
    pub(crate) summary_detail: Option<V10SummaryDetail>,
}

#[derive(Deserialize, Default)]
pub(crate) struct V10AssetProfile {
    pub(crate) sector: Option<String>,
    pub(crate) industry: Option<String>,
    pub(crate) website: Option<String>,
    #[serde(rename = "longBusinessSummary")]
    pub(crate) long_business_summary: Option<String>,
}

#[derive(Deserialize, Default)]
pub(crate) struct V10Price {
    pub(crate) symbol: Option<String>,
    #[serde(rename = "longName")]
    pub(crate) long_name: Option<String>,
    #[serde(rename = "shortName")]
    pub(crate) short_name: Option<String>,
}

#[derive(Deserialize, Default)]
pub(crate) struct V10SummaryDetail {
    #[serde(rename = "marketCap")]
    pub(crate) market_cap: Option<RawNum<f64>>,
    #[serde(rename = "trailingPE")]
    pub(crate) trailing_pe: Option<RawNum<f64>>,
}

#[derive(Deserialize, Clone, Copy)]
pub(crate) struct RawNum<T> {
    pub(crate) raw: Option<T>,
}

pub(crate) fn from_raw<T>(raw: Option<RawNum<T>>) -> Option<T> {
    raw.and_then(|n| n.raw)
}

pub(crate) fn from_raw_u64_round(r: Option<RawNum<f64>>) -> Option<u64> {
    from_raw(r).and_then(|v| {
        let rounded = v.round();
        if rounded.is_finite() && rounded >= 0.0 {
            // Bounds checked above; saturates at u64::MAX.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(rounded as u64)
        } else {
            None
        }
    })
}
