use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored news article. The URL is its identity: a URL is stored at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    /// Empty when the provider had none.
    pub summary: String,
    pub url: String,
    /// Outlet name, `"Unknown"` when absent.
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// When the article was fetched; drives collection freshness.
    pub fetched_at: DateTime<Utc>,
}

impl NewsArticle {
    /// Title and summary joined for downstream text consumers.
    #[must_use]
    pub fn ai_context(&self) -> String {
        match (self.title.is_empty(), self.summary.is_empty()) {
            (false, false) => format!("{}. {}", self.title, self.summary),
            (false, true) => self.title.clone(),
            (true, _) => self.summary.clone(),
        }
    }
}

/// Identifies a news collection: a category and how many articles to return.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewsQuery {
    pub category: String,
    pub limit: u32,
}

impl NewsQuery {
    /// A query for `limit` articles in `category`.
    pub fn new(category: impl Into<String>, limit: u32) -> Self {
        Self {
            category: category.into(),
            limit,
        }
    }
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self::new("business", 10)
    }
}

impl fmt::Display for NewsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.limit)
    }
}
