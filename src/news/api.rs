use chrono::{DateTime, Utc};
use url::Url;

use crate::core::{FetchError, HttpClient, net};
use crate::news::model::{NewsArticle, NewsQuery};
use crate::news::wire::{ArticleNode, HeadlinesEnvelope};

const UNKNOWN_SOURCE: &str = "Unknown";

pub(crate) async fn fetch_headlines(
    client: &HttpClient,
    base: &Url,
    api_key: &str,
    country: &str,
    query: &NewsQuery,
) -> Result<Vec<NewsArticle>, FetchError> {
    let mut url = base
        .join("top-headlines")
        .map_err(|e| FetchError::Malformed(format!("news url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("category", &query.category)
        .append_pair("country", country)
        .append_pair("pageSize", &query.limit.to_string());

    // The key goes in a header so it never shows up in logged URLs.
    let req = client
        .http()
        .get(url.clone())
        .header("X-Api-Key", api_key)
        .header("accept", "application/json");
    let resp = client.send_with_retry(req).await?;
    let env: HeadlinesEnvelope = net::get_json(resp, "news_headlines").await?;

    if env.status.as_deref() != Some("ok") {
        let code = env.code.unwrap_or_default();
        if code == "rateLimited" {
            return Err(FetchError::RateLimited {
                url: url.to_string(),
            });
        }
        let message = env.message.unwrap_or_default();
        return Err(FetchError::Malformed(format!("news api error {code}: {message}")));
    }

    let now = Utc::now();
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
    Ok(env
        .articles
        .into_iter()
        .filter_map(|node| normalize(node, now))
        .take(limit)
        .collect())
}

/// Null-free article from a provider node, or `None` when it has no URL or no text at all.
pub(crate) fn normalize(node: ArticleNode, now: DateTime<Utc>) -> Option<NewsArticle> {
    let url = clean(node.url);
    let title = clean(node.title);
    let summary = clean(node.description);
    if url.is_empty() || (title.is_empty() && summary.is_empty()) {
        return None;
    }

    let source = node
        .source
        .and_then(|s| s.name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let published_at = node
        .published_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map_or(now, |d| d.with_timezone(&Utc));

    Some(NewsArticle {
        title,
        summary,
        url,
        source,
        published_at,
        fetched_at: now,
    })
}

fn clean(v: Option<String>) -> String {
    v.map(|s| s.trim().to_string()).unwrap_or_default()
}
