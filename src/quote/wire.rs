use serde::Deserialize;

// Wire model for the v7 quote API
#[derive(Deserialize)]
pub(crate) struct V7Envelope {
    #[serde(rename = "quoteResponse")]
    pub(crate) quote_response: Option<V7QuoteResponse>,
}

#[derive(Deserialize)]
pub(crate) struct V7QuoteResponse {
    pub(crate) result: Option<Vec<V7QuoteNode>>,
    pub(crate) error: Option<serde_json::Value>,
}

#[derive(Deserialize, Clone, Default)]
pub(crate) struct V7QuoteNode {
    #[serde(default)]
    pub(crate) symbol: Option<String>,
    #[serde(rename = "currentPrice")]
    pub(crate) current_price: Option<f64>,
    #[serde(rename = "regularMarketPrice")]
    pub(crate) regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketPreviousClose", alias = "previousClose")]
    pub(crate) previous_close: Option<f64>,
    #[serde(rename = "regularMarketDayHigh", alias = "dayHigh")]
    pub(crate) day_high: Option<f64>,
    #[serde(rename = "regularMarketDayLow", alias = "dayLow")]
    pub(crate) day_low: Option<f64>,
    #[serde(rename = "regularMarketVolume", alias = "volume")]
    pub(crate) volume: Option<f64>,
}
