//! Centralized constants for default endpoints and UA.

/// Default desktop UA to avoid trivial bot blocking.
pub(crate) const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/122.0.0.0 Safari/537.36"
);

/// Yahoo v7 quote API (symbols are passed as a query parameter).
pub(crate) const DEFAULT_BASE_QUOTE_V7: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Yahoo quoteSummary API base (symbol is appended).
pub(crate) const DEFAULT_BASE_QUOTE_API: &str =
    "https://query1.finance.yahoo.com/v10/finance/quoteSummary/";

/// NewsAPI.org v2 base.
pub(crate) const DEFAULT_BASE_NEWS: &str = "https://newsapi.org/v2/";

/// OpenAI-compatible chat completion base.
pub(crate) const DEFAULT_BASE_COMPLETION: &str = "https://api.openai.com/v1/";

/// Chat model used when none is configured.
pub(crate) const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
