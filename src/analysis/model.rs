use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall market direction called by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[serde(alias = "Bullish", alias = "BULLISH", alias = "positive")]
    Bullish,
    #[serde(alias = "Bearish", alias = "BEARISH", alias = "negative")]
    Bearish,
    #[serde(alias = "Neutral", alias = "NEUTRAL", alias = "mixed")]
    Neutral,
}

/// Risk level called by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM", alias = "moderate")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

/// Structured result of a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub sentiment: Sentiment,
    #[serde(default)]
    pub key_factors: Vec<String>,
    pub risk_level: RiskLevel,
}

/// A generated market commentary, cached per kind (e.g. `daily`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: String,
    /// The raw completion text.
    pub content: String,
    pub analysis: Analysis,
    pub generated_at: DateTime<Utc>,
}
