//! Side-effect-free status report.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of [`MarketCache::health`](crate::MarketCache::health).
///
/// Built from a single store ping; providers are never contacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub store_connected: bool,
    /// Why the store ping failed.
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub(crate) const fn healthy(checked_at: DateTime<Utc>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            store_connected: true,
            error: None,
            checked_at,
        }
    }

    pub(crate) fn unhealthy(error: impl ToString, checked_at: DateTime<Utc>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            store_connected: false,
            error: Some(error.to_string()),
            checked_at,
        }
    }

    /// `true` when the store answered.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
