//! Company profiles: one replaceable row per ticker.

pub(crate) mod api;
mod model;
pub(crate) mod wire;

pub use model::CompanyProfile;

use chrono::{DateTime, Utc};

use crate::core::CacheError;
use crate::core::entity::{CacheEntity, normalize_ticker};

/// Binds [`CompanyProfile`] into the cache-first algorithm, keyed by ticker.
#[derive(Debug, Clone, Copy)]
pub struct ProfileEntity;

impl CacheEntity for ProfileEntity {
    type Key = String;
    type Value = CompanyProfile;

    const KIND: &'static str = "profile";

    fn normalize_key(key: &String) -> Result<String, CacheError> {
        normalize_ticker(Self::KIND, key)
    }

    fn timestamp(value: &CompanyProfile) -> Option<DateTime<Utc>> {
        Some(value.last_updated)
    }

    fn stamp(value: &mut CompanyProfile, now: DateTime<Utc>) {
        value.last_updated = now;
    }
}
