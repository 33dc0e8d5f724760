//! Market quotes: the append-only price history and its cache binding.

pub(crate) mod api;
mod model;
pub(crate) mod wire;

pub use model::Quote;

use chrono::{DateTime, Utc};

use crate::core::entity::{CacheEntity, normalize_ticker};
use crate::core::CacheError;

/// Binds [`Quote`] into the cache-first algorithm, keyed by ticker.
///
/// Freshness is judged on the newest stored row's `captured_at`.
#[derive(Debug, Clone, Copy)]
pub struct QuoteEntity;

impl CacheEntity for QuoteEntity {
    type Key = String;
    type Value = Quote;

    const KIND: &'static str = "quote";

    fn normalize_key(key: &String) -> Result<String, CacheError> {
        normalize_ticker(Self::KIND, key)
    }

    fn timestamp(value: &Quote) -> Option<DateTime<Utc>> {
        Some(value.captured_at)
    }

    fn stamp(value: &mut Quote, now: DateTime<Utc>) {
        value.captured_at = now;
    }
}
