use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One captured market quote. Rows are append-only: every successful fetch adds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Upper-cased ticker symbol.
    pub ticker: String,
    /// Last traded price, rounded to cents.
    pub price: f64,
    /// Percent change against the previous close, rounded to 2 decimals.
    pub change_percent: f64,
    /// Day high.
    pub high: f64,
    /// Day low.
    pub low: f64,
    /// Day volume.
    pub volume: u64,
    /// When this row was captured; the only input to staleness checks.
    pub captured_at: DateTime<Utc>,
}
