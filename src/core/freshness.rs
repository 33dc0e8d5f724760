//! Staleness predicate shared by every entity kind.

use chrono::{DateTime, TimeDelta, Utc};

use crate::core::CacheError;

/// Result of comparing a cached record's timestamp against a max-age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// `now - timestamp <= max_age`.
    Fresh,
    /// A record exists but is older than the max-age.
    Stale,
    /// Nothing is cached.
    Absent,
}

impl Freshness {
    /// Evaluates an optional timestamp. A missing timestamp is always [`Freshness::Absent`].
    #[must_use]
    pub fn evaluate(timestamp: Option<DateTime<Utc>>, max_age: TimeDelta, now: DateTime<Utc>) -> Self {
        match timestamp {
            None => Self::Absent,
            Some(ts) if is_fresh(ts, max_age, now) => Self::Fresh,
            Some(_) => Self::Stale,
        }
    }

    /// `true` only for [`Freshness::Fresh`].
    #[must_use]
    pub const fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// `now - timestamp <= max_age`.
///
/// Clock skew is not compensated: a timestamp in the future has a negative age and counts as fresh.
#[must_use]
pub fn is_fresh(timestamp: DateTime<Utc>, max_age: TimeDelta, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(timestamp) <= max_age
}

/// Rejects negative max-ages.
pub fn validate_max_age(kind: &'static str, max_age: TimeDelta) -> Result<TimeDelta, CacheError> {
    if max_age < TimeDelta::zero() {
        return Err(CacheError::InvalidMaxAge {
            kind,
            seconds: max_age.num_seconds(),
        });
    }
    Ok(max_age)
}
