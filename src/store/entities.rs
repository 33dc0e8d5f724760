use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{SqliteStore, from_millis, to_millis};
use crate::analysis::{Analysis, Insight, InsightEntity};
use crate::core::{EntityStore, StoreError};
use crate::news::{NewsArticle, NewsEntity, NewsQuery};
use crate::profile::{CompanyProfile, ProfileEntity};
use crate::quote::{Quote, QuoteEntity};

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn to_u64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

/* ----------------------------- quotes ----------------------------- */

pub(crate) struct QuoteRow {
    ticker: String,
    price: f64,
    change_percent: f64,
    high: f64,
    low: f64,
    volume: i64,
    captured_at: i64,
}

pub(crate) fn quote_row(r: &Row<'_>) -> rusqlite::Result<QuoteRow> {
    Ok(QuoteRow {
        ticker: r.get(0)?,
        price: r.get(1)?,
        change_percent: r.get(2)?,
        high: r.get(3)?,
        low: r.get(4)?,
        volume: r.get(5)?,
        captured_at: r.get(6)?,
    })
}

pub(crate) fn finish_quote(r: QuoteRow) -> Result<Quote, StoreError> {
    Ok(Quote {
        ticker: r.ticker,
        price: r.price,
        change_percent: r.change_percent,
        high: r.high,
        low: r.low,
        volume: to_u64(r.volume),
        captured_at: from_millis(r.captured_at)?,
    })
}

#[async_trait]
impl EntityStore<QuoteEntity> for SqliteStore {
    async fn upsert(&self, ticker: &String, mut quote: Quote) -> Result<Quote, StoreError> {
        quote.ticker.clone_from(ticker);
        let row = quote.clone();
        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO quotes (ticker, price, change_percent, high, low, volume, captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.ticker,
                    row.price,
                    row.change_percent,
                    row.high,
                    row.low,
                    to_i64(row.volume),
                    to_millis(row.captured_at)
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(quote)
    }

    async fn read_latest(&self, ticker: &String) -> Result<Option<Quote>, StoreError> {
        let ticker = ticker.clone();
        self.with_conn(move |c| {
            c.query_row(
                "SELECT ticker, price, change_percent, high, low, volume, captured_at
                 FROM quotes WHERE ticker = ?1
                 ORDER BY captured_at DESC, id DESC LIMIT 1",
                params![ticker],
                quote_row,
            )
            .optional()?
            .map(finish_quote)
            .transpose()
        })
        .await
    }
}

/* ---------------------------- profiles ---------------------------- */

fn profile_row(r: &Row<'_>) -> rusqlite::Result<(CompanyProfile, i64)> {
    let profile = CompanyProfile {
        ticker: r.get(0)?,
        company_name: r.get(1)?,
        sector: r.get(2)?,
        industry: r.get(3)?,
        market_cap: to_u64(r.get(4)?),
        pe_ratio: r.get(5)?,
        description: r.get(6)?,
        website: r.get(7)?,
        last_updated: DateTime::<Utc>::UNIX_EPOCH,
    };
    Ok((profile, r.get(8)?))
}

#[async_trait]
impl EntityStore<ProfileEntity> for SqliteStore {
    async fn upsert(&self, ticker: &String, mut profile: CompanyProfile) -> Result<CompanyProfile, StoreError> {
        profile.ticker.clone_from(ticker);
        let p = profile.clone();
        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO company_profiles
                    (ticker, company_name, sector, industry, market_cap, pe_ratio, description, website, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(ticker) DO UPDATE SET
                    company_name = excluded.company_name,
                    sector = excluded.sector,
                    industry = excluded.industry,
                    market_cap = excluded.market_cap,
                    pe_ratio = excluded.pe_ratio,
                    description = excluded.description,
                    website = excluded.website,
                    last_updated = excluded.last_updated",
                params![
                    p.ticker,
                    p.company_name,
                    p.sector,
                    p.industry,
                    to_i64(p.market_cap),
                    p.pe_ratio,
                    p.description,
                    p.website,
                    to_millis(p.last_updated)
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(profile)
    }

    async fn read_latest(&self, ticker: &String) -> Result<Option<CompanyProfile>, StoreError> {
        let ticker = ticker.clone();
        self.with_conn(move |c| {
            let Some((mut profile, updated)) = c
                .query_row(
                    "SELECT ticker, company_name, sector, industry, market_cap, pe_ratio,
                            description, website, last_updated
                     FROM company_profiles WHERE ticker = ?1",
                    params![ticker],
                    profile_row,
                )
                .optional()?
            else {
                return Ok(None);
            };
            profile.last_updated = from_millis(updated)?;
            Ok(Some(profile))
        })
        .await
    }
}

/* ------------------------------ news ------------------------------ */

/// The category view: articles linked to the category at or after `since` (epoch millis),
/// newest publication first. `fetched_at` is when the category last received the article.
fn read_news(c: &Connection, query: &NewsQuery, since: i64) -> Result<Vec<NewsArticle>, StoreError> {
    let mut stmt = c.prepare(
        "SELECT n.title, n.summary, n.url, n.source, n.published_at, l.fetched_at
         FROM news_categories l JOIN news n ON n.url = l.url
         WHERE l.category = ?1 AND l.fetched_at >= ?2
         ORDER BY n.published_at DESC, n.id DESC LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![query.category, since, query.limit], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, i64>(4)?,
            r.get::<_, i64>(5)?,
        ))
    })?;

    rows.map(|r| -> Result<NewsArticle, StoreError> {
        let (title, summary, url, source, published, fetched) = r?;
        Ok(NewsArticle {
            title,
            summary,
            url,
            source,
            published_at: from_millis(published)?,
            fetched_at: from_millis(fetched)?,
        })
    })
    .collect()
}

#[async_trait]
impl EntityStore<NewsEntity> for SqliteStore {
    /// Stores every article whose URL is new and links the batch to the category.
    ///
    /// Known URLs keep their stored content; only the category link is refreshed.
    async fn upsert(&self, query: &NewsQuery, articles: Vec<NewsArticle>) -> Result<Vec<NewsArticle>, StoreError> {
        let query = query.clone();
        self.with_conn(move |c| {
            let tx = c.transaction()?;
            let mut inserted = 0usize;
            let mut skipped = 0usize;
            for a in &articles {
                let fetched = to_millis(a.fetched_at);
                let n = tx.execute(
                    "INSERT OR IGNORE INTO news (title, summary, url, source, published_at, fetched_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![a.title, a.summary, a.url, a.source, to_millis(a.published_at), fetched],
                )?;
                if n == 0 {
                    tracing::debug!(url = %a.url, "article already stored");
                    skipped += 1;
                } else {
                    inserted += 1;
                }
                tx.execute(
                    "INSERT INTO news_categories (url, category, fetched_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(url, category) DO UPDATE SET
                        fetched_at = MAX(fetched_at, excluded.fetched_at)",
                    params![a.url, query.category, fetched],
                )?;
            }
            tx.commit()?;
            tracing::debug!(query = %query, inserted, skipped, "stored headlines");
            read_news(c, &query, i64::MIN)
        })
        .await
    }

    async fn read_latest(&self, query: &NewsQuery) -> Result<Option<Vec<NewsArticle>>, StoreError> {
        let query = query.clone();
        self.with_conn(move |c| {
            let articles = read_news(c, &query, i64::MIN)?;
            Ok((!articles.is_empty()).then_some(articles))
        })
        .await
    }

    /// Only articles the category received within `max_age`; `None` when there are none.
    async fn read_fresh(
        &self,
        query: &NewsQuery,
        max_age: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<NewsArticle>>, StoreError> {
        let query = query.clone();
        let cutoff = now.checked_sub_signed(max_age).map_or(i64::MIN, to_millis);
        self.with_conn(move |c| {
            let articles = read_news(c, &query, cutoff)?;
            Ok((!articles.is_empty()).then_some(articles))
        })
        .await
    }
}

/* ---------------------------- insights ---------------------------- */

#[async_trait]
impl EntityStore<InsightEntity> for SqliteStore {
    async fn upsert(&self, kind: &String, mut insight: Insight) -> Result<Insight, StoreError> {
        insight.kind.clone_from(kind);
        let analysis = serde_json::to_string(&insight.analysis)
            .map_err(|e| StoreError::Corrupt(format!("analysis encode: {e}")))?;
        let row = insight.clone();
        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO ai_insights (kind, content, analysis, generated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.kind, row.content, analysis, to_millis(row.generated_at)],
            )?;
            Ok(())
        })
        .await?;
        Ok(insight)
    }

    async fn read_latest(&self, kind: &String) -> Result<Option<Insight>, StoreError> {
        let kind = kind.clone();
        self.with_conn(move |c| {
            let Some((kind, content, analysis, generated)) = c
                .query_row(
                    "SELECT kind, content, analysis, generated_at
                     FROM ai_insights WHERE kind = ?1
                     ORDER BY generated_at DESC, id DESC LIMIT 1",
                    params![kind],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, String>(2)?,
                            r.get::<_, i64>(3)?,
                        ))
                    },
                )
                .optional()?
            else {
                return Ok(None);
            };
            let analysis: Analysis = serde_json::from_str(&analysis)
                .map_err(|e| StoreError::Corrupt(format!("analysis decode: {e}")))?;
            Ok(Some(Insight {
                kind,
                content,
                analysis,
                generated_at: from_millis(generated)?,
            }))
        })
        .await
    }
}
