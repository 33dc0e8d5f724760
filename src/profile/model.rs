use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slow-changing company facts. One row per ticker; a refresh replaces it.
///
/// Text fields the provider omits hold `"N/A"`; numeric ones hold zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: u64,
    pub pe_ratio: f64,
    pub description: String,
    pub website: String,
    /// When the row was last written.
    pub last_updated: DateTime<Utc>,
}
